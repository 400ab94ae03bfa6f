//! Accessory Storefront
//!
//! Cart, coupon and order placement pipeline for a mobile-accessories shop.
//!
//! ## Features
//! - Per-user cart with merge-on-duplicate line items
//! - Coupon validation (pure) and idempotent redemption accounting
//! - Order placement with atomic header + item persistence
//! - Admin-driven order status workflow
//! - PostgreSQL and in-memory storage backends

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod http;
pub mod services;
pub mod store;

pub use config::AppConfig;
pub use domain::aggregates::{
    CartItem, CartLine, Coupon, DiscountType, Order, OrderDetail, OrderItem, OrderLine, OrderStatus, PaymentMethod,
    PaymentStatus, PlacedOrder, Product, ShippingAddress,
};
pub use domain::pricing::{OrderTotals, ShippingPolicy};
pub use services::{AdminGate, AllowListAdminGate, CartService, CouponService, OrderService};
pub use store::StorefrontStore;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Admin access required")]
    Forbidden,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StorefrontError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short machine-readable tag used at the request boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Forbidden => "forbidden",
            Self::Unauthenticated => "unauthenticated",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "dependency",
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
