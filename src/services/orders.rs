//! Order assembly and administration
//!
//! Placement checks every precondition before the first write, persists the
//! header and items as one unit, and only then clears the cart. Anything that
//! happens after the order is durable is best-effort.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::access::AdminGate;
use super::coupons::CouponService;
use super::events::EventPublisher;
use crate::domain::aggregates::{
    build_order_items, validate_coupon, Order, OrderLineInput, OrderStatus, PaymentMethod,
    OrderDetail, PlacedOrder, ShippingAddress,
};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::pricing::{lines_subtotal, OrderTotals, PricingError, ShippingPolicy};
use crate::domain::value_objects::OrderNumber;
use crate::store::StorefrontStore;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderLineInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Total the client displayed; informational only.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

fn pricing_err(e: PricingError) -> StorefrontError {
    StorefrontError::validation(e.to_string())
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn StorefrontStore>,
    coupons: CouponService,
    admin: Arc<dyn AdminGate>,
    shipping: ShippingPolicy,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn StorefrontStore>,
        coupons: CouponService,
        admin: Arc<dyn AdminGate>,
        shipping: ShippingPolicy,
        events: EventPublisher,
    ) -> Self {
        Self { store, coupons, admin, shipping, events }
    }

    pub async fn place_order(&self, user_id: &str, request: PlaceOrder) -> Result<PlacedOrder> {
        let missing = request.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(StorefrontError::validation(format!("Missing shipping details: {}", missing.join(", "))));
        }

        let order_id = Uuid::now_v7();
        // Item prices are taken from the submitted snapshot, not the catalog.
        let items = build_order_items(order_id, &request.items).map_err(|e| StorefrontError::validation(e.to_string()))?;

        let subtotal = lines_subtotal(&request.items).map_err(pricing_err)?;

        let coupon_code = request.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let discount = match coupon_code {
            Some(code) => self.coupon_discount(code, subtotal).await?,
            None => Decimal::ZERO,
        };
        let totals = OrderTotals::compute(&request.items, discount, &self.shipping).map_err(pricing_err)?;
        if let Some(claimed) = request.total_amount {
            if claimed != totals.total {
                tracing::warn!(user_id, %claimed, computed = %totals.total, "client total differs from computed total");
            }
        }

        let now = Utc::now();
        let order = Order {
            id: order_id,
            order_number: OrderNumber::generate(now).into_inner(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            discount_amount: totals.discount,
            shipping_fee: totals.shipping_fee,
            total_amount: totals.total,
            coupon_code: coupon_code.map(String::from),
            payment_method: request.payment_method,
            payment_status: request.payment_method.initial_payment_status(),
            shipping_address: request.shipping_address,
            tracking_number: None,
            created_at: now,
            updated_at: now,
        };

        let placed = self.store.insert_order(&order, &items).await?;
        tracing::info!(
            order_id = %placed.order.id,
            order_number = %placed.order.order_number,
            user_id,
            items = placed.items.len(),
            total = %placed.order.total_amount,
            "order placed"
        );

        if let Err(e) = self.store.clear_cart(user_id).await {
            tracing::warn!(user_id, order_id = %placed.order.id, error = %e, "order placed but cart was not cleared");
        }
        if let Some(code) = &placed.order.coupon_code {
            if let Err(e) = self.coupons.redeem(code, placed.order.id).await {
                tracing::warn!(code = %code, order_id = %placed.order.id, error = %e, "coupon redemption not recorded");
            }
        }
        self.events
            .publish(DomainEvent::Order(OrderEvent::Placed {
                order_id: placed.order.id,
                order_number: placed.order.order_number.clone(),
                user_id: user_id.to_string(),
                total: placed.order.total_amount,
                items: placed.items.len(),
            }))
            .await;

        Ok(placed)
    }

    async fn coupon_discount(&self, code: &str, subtotal: Decimal) -> Result<Decimal> {
        let coupon = self.store.get_coupon(code).await?;
        let verdict = validate_coupon(coupon.as_ref(), subtotal, Utc::now());
        match (verdict.valid, verdict.discount) {
            (true, Some(discount)) => Ok(discount),
            _ => Err(StorefrontError::validation(verdict.message.unwrap_or_else(|| "Invalid coupon code".to_string()))),
        }
    }

    /// Admins see every order, everyone else only their own.
    pub async fn list_orders(&self, actor: &str) -> Result<Vec<Order>> {
        if self.admin.is_admin(actor).await {
            self.store.list_orders(None).await
        } else {
            self.store.list_orders(Some(actor)).await
        }
    }

    /// Orders owned by someone else look the same as missing ones.
    pub async fn get_order(&self, actor: &str, order_id: Uuid) -> Result<OrderDetail> {
        let detail = self.store.get_order(order_id).await?.ok_or(StorefrontError::NotFound("Order"))?;
        if detail.order.user_id != actor && !self.admin.is_admin(actor).await {
            return Err(StorefrontError::NotFound("Order"));
        }
        Ok(detail)
    }

    pub async fn update_status(&self, actor: &str, order_id: Uuid, update: StatusUpdate) -> Result<Order> {
        if !self.admin.is_admin(actor).await {
            return Err(StorefrontError::Forbidden);
        }
        let mut current = self.store.get_order(order_id).await?.ok_or(StorefrontError::NotFound("Order"))?.order;
        let previous = current.apply_status(update.status).map_err(|e| StorefrontError::validation(e.to_string()))?;

        let tracking = update.tracking_number.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let updated = self
            .store
            .update_order_status(order_id, previous, update.status, tracking)
            .await?
            .ok_or_else(|| StorefrontError::Conflict(format!("order {} changed status concurrently", order_id)))?;

        tracing::info!(%order_id, actor, from = %previous, to = %updated.status, "order status changed");
        self.events
            .publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id, from: previous, to: updated.status }))
            .await;
        Ok(updated)
    }
}
