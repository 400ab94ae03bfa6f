use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{CartItem, CartLine};
use crate::domain::value_objects::Quantity;
use crate::store::StorefrontStore;
use crate::{Result, StorefrontError};

/// Per-user cart operations. Unknown item ids, and ids owned by another user,
/// are reported as `NotFound`.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn StorefrontStore>,
}

fn quantity(value: i32) -> Result<Quantity> {
    Quantity::new(value).map_err(|e| StorefrontError::validation(e.to_string()))
}

impl CartService {
    pub fn new(store: Arc<dyn StorefrontStore>) -> Self { Self { store } }

    /// Adds to the existing line for the product if there is one.
    pub async fn add_to_cart(&self, user_id: &str, product_id: Uuid, qty: i32) -> Result<CartItem> {
        let qty = quantity(qty)?;
        self.store.get_product(product_id).await?.ok_or(StorefrontError::NotFound("Product"))?;
        let item = self.store.upsert_cart_item(user_id, product_id, qty).await?;
        tracing::info!(user_id, %product_id, added = qty.value(), quantity = item.quantity, "cart item merged");
        Ok(item)
    }

    /// Use [`CartService::remove_item`] to drop a line; zero is rejected here.
    pub async fn update_quantity(&self, user_id: &str, item_id: Uuid, qty: i32) -> Result<CartItem> {
        let qty = quantity(qty)?;
        self.store
            .set_cart_quantity(user_id, item_id, qty)
            .await?
            .ok_or(StorefrontError::NotFound("Cart item"))
    }

    pub async fn remove_item(&self, user_id: &str, item_id: Uuid) -> Result<()> {
        if !self.store.delete_cart_item(user_id, item_id).await? {
            return Err(StorefrontError::NotFound("Cart item"));
        }
        Ok(())
    }

    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        self.store.clear_cart(user_id).await
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<CartLine>> {
        self.store.list_cart(user_id).await
    }
}
