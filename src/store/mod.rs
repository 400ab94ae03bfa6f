//! Storage backends
//!
//! [`StorefrontStore`] is the persistence seam used by the services. The
//! PostgreSQL backend is used in production; [`memory::MemoryStore`] backs the
//! test suite and supports fault injection.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CartLine, Coupon, Order, OrderDetail, OrderItem, OrderStatus, PlacedOrder, Product,
};
use crate::domain::value_objects::Quantity;
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait StorefrontStore: Send + Sync {
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Inserts the line or adds `quantity` to the existing (user, product)
    /// row in a single atomic statement. A merged quantity that overflows the
    /// column is a Validation error and leaves the row unchanged.
    async fn upsert_cart_item(&self, user_id: &str, product_id: Uuid, quantity: Quantity) -> Result<CartItem>;

    /// Returns `None` when no row with this id belongs to the user.
    async fn set_cart_quantity(&self, user_id: &str, id: Uuid, quantity: Quantity) -> Result<Option<CartItem>>;

    async fn delete_cart_item(&self, user_id: &str, id: Uuid) -> Result<bool>;

    async fn clear_cart(&self, user_id: &str) -> Result<u64>;

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartLine>>;

    /// Case-sensitive exact match.
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>>;

    /// Records that `order_id` used the coupon. Returns `false` without
    /// touching `used_count` if the pair was already recorded.
    async fn record_coupon_redemption(&self, code: &str, order_id: Uuid) -> Result<bool>;

    /// Persists header and items as one unit; on failure neither remains.
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<PlacedOrder>;

    /// Header plus items, each joined with its product if it still exists.
    async fn get_order(&self, id: Uuid) -> Result<Option<OrderDetail>>;

    /// Newest first. `None` lists every user's orders.
    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>>;

    /// Compare-and-set on status. Returns `None` if the order is missing or
    /// its status is no longer `from`.
    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<Order>>;
}
