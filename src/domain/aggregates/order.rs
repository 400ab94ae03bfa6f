//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::Product;
use crate::domain::value_objects::{check_amount, AmountError, Quantity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Cod, Online }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Completed }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Shipped => "shipped",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Forward progression is one step at a time; cancellation is allowed from
    /// any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Confirmed, Shipped) | (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cod => "cod", Self::Online => "online" }
    }

    /// Online payments are verified upstream before the order is submitted.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self { Self::Cod => PaymentStatus::Pending, Self::Online => PaymentStatus::Completed }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed" }
    }
}

macro_rules! parse_lowercase {
    ($ty:ident { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }
    };
}

parse_lowercase!(OrderStatus { "pending" => Pending, "confirmed" => Confirmed, "shipped" => Shipped, "delivered" => Delivered, "cancelled" => Cancelled });
parse_lowercase!(PaymentMethod { "cod" => Cod, "online" => Online });
parse_lowercase!(PaymentStatus { "pending" => Pending, "completed" => Completed });

fn default_country() -> String { "India".to_string() }

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("blank")); }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank")]
    pub phone_number: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub state: String,
    #[validate(custom = "not_blank")]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are missing or blank, sorted.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let mut fields: Vec<&'static str> = errors.field_errors().keys().copied().collect();
                fields.sort_unstable();
                fields
            }
        }
    }
}

/// Order header as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line with a frozen price; never re-read from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order line joined with its catalog entry, which may since have been
/// removed. The snapshot price stays authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// Caller-supplied line snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

impl Order {
    pub fn apply_status(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::IllegalTransition { from: self.status, to: next });
        }
        let previous = std::mem::replace(&mut self.status, next);
        self.updated_at = Utc::now();
        Ok(previous)
    }
}

/// Builds the rows for a new order. Checks every precondition before
/// anything is written; a price must be storable without rounding.
pub fn build_order_items(order_id: Uuid, lines: &[OrderLineInput]) -> Result<Vec<OrderItem>, OrderError> {
    if lines.is_empty() { return Err(OrderError::NoItems); }
    lines
        .iter()
        .map(|line| {
            let quantity = Quantity::new(line.quantity).map_err(|_| OrderError::InvalidQuantity(line.product_id))?;
            let price = check_amount(line.price).map_err(|e| OrderError::InvalidPrice(line.product_id, e))?;
            Ok(OrderItem { id: Uuid::now_v7(), order_id, product_id: line.product_id, quantity: quantity.value(), price })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    NoItems,
    InvalidQuantity(Uuid),
    InvalidPrice(Uuid, AmountError),
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "Order must contain at least one item"),
            Self::InvalidQuantity(p) => write!(f, "Quantity for product {} must be at least 1", p),
            Self::InvalidPrice(p, e) => write!(f, "Price for product {} {}", p, e),
            Self::IllegalTransition { from, to } => write!(f, "Cannot move order from {} to {}", from, to),
        }
    }
}
