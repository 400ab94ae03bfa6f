use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::events::EventPublisher;
use crate::domain::aggregates::{validate_coupon, CouponValidation};
use crate::domain::events::{CouponEvent, DomainEvent};
use crate::domain::value_objects::check_amount;
use crate::store::StorefrontStore;
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn StorefrontStore>,
    events: EventPublisher,
}

impl CouponService {
    pub fn new(store: Arc<dyn StorefrontStore>, events: EventPublisher) -> Self { Self { store, events } }

    /// Read-only; an ineligible coupon comes back as `valid: false`.
    pub async fn validate(&self, code: &str, amount: Decimal) -> Result<CouponValidation> {
        let amount = check_amount(amount).map_err(|e| StorefrontError::validation(format!("amount {}", e)))?;
        let coupon = self.store.get_coupon(code).await?;
        Ok(validate_coupon(coupon.as_ref(), amount, Utc::now()))
    }

    /// Counts one use of `code` for `order_id`. Retrying for the same order
    /// is a no-op and returns `false`.
    pub async fn redeem(&self, code: &str, order_id: Uuid) -> Result<bool> {
        let recorded = self.store.record_coupon_redemption(code, order_id).await?;
        if recorded {
            tracing::info!(code, %order_id, "coupon redeemed");
            self.events.publish(DomainEvent::Coupon(CouponEvent::Redeemed { code: code.to_string(), order_id })).await;
        } else {
            tracing::debug!(code, %order_id, "coupon redemption already recorded");
        }
        Ok(recorded)
    }
}
