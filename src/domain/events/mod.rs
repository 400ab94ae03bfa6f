//! Domain events
//!
//! Published best-effort after the corresponding state change is durable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Coupon(CouponEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, user_id: String, total: Decimal, items: usize },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CouponEvent {
    Redeemed { code: String, order_id: Uuid },
}

impl DomainEvent {
    /// NATS subject for this event.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "storefront.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.orders.status_changed",
            Self::Coupon(CouponEvent::Redeemed { .. }) => "storefront.coupons.redeemed",
        }
    }
}
