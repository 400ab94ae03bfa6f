use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::StorefrontStore;
use crate::domain::aggregates::{
    CartItem, CartLine, Coupon, Order, OrderDetail, OrderItem, OrderLine, OrderStatus, PlacedOrder, Product,
};
use crate::domain::value_objects::Quantity;
use crate::{Result, StorefrontError};

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    cart: Vec<CartItem>,
    coupons: HashMap<String, Coupon>,
    redemptions: HashSet<(String, Uuid)>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// In-process store with the same semantics as the PostgreSQL backend.
/// A single lock guards all tables, so every call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pub fail_order_items: AtomicBool,
    pub fail_cart_clear: AtomicBool,
    pub unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn remove_product(&self, id: Uuid) {
        self.state.lock().await.products.remove(&id);
    }

    pub async fn set_product_price(&self, id: Uuid, price: Decimal) {
        if let Some(p) = self.state.lock().await.products.get_mut(&id) {
            p.price = price;
        }
    }

    pub async fn insert_coupon(&self, coupon: Coupon) {
        self.state.lock().await.coupons.insert(coupon.code.clone(), coupon);
    }

    pub async fn order_count(&self) -> usize { self.state.lock().await.orders.len() }

    pub async fn order_item_count(&self) -> usize { self.state.lock().await.order_items.len() }

    pub async fn cart_row_count(&self, user_id: &str) -> usize {
        self.state.lock().await.cart.iter().filter(|c| c.user_id == user_id).count()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorefrontError::Storage("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorefrontStore for MemoryStore {
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        self.check_available()?;
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn upsert_cart_item(&self, user_id: &str, product_id: Uuid, quantity: Quantity) -> Result<CartItem> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if let Some(existing) = state.cart.iter_mut().find(|c| c.user_id == user_id && c.product_id == product_id) {
            existing.quantity = Quantity::new(existing.quantity)
                .ok()
                .and_then(|q| q.checked_add(quantity))
                .ok_or_else(|| StorefrontError::validation("Cart quantity is too large"))?
                .value();
            return Ok(existing.clone());
        }
        let item = CartItem {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            product_id,
            quantity: quantity.value(),
            created_at: Utc::now(),
        };
        state.cart.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(&self, user_id: &str, id: Uuid, quantity: Quantity) -> Result<Option<CartItem>> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.cart.iter_mut().find(|c| c.id == id && c.user_id == user_id).map(|c| {
            c.quantity = quantity.value();
            c.clone()
        }))
    }

    async fn delete_cart_item(&self, user_id: &str, id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.cart.len();
        state.cart.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(state.cart.len() != before)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64> {
        self.check_available()?;
        if self.fail_cart_clear.load(Ordering::SeqCst) {
            return Err(StorefrontError::Storage("injected cart clear failure".to_string()));
        }
        let mut state = self.state.lock().await;
        let before = state.cart.len();
        state.cart.retain(|c| c.user_id != user_id);
        Ok((before - state.cart.len()) as u64)
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartLine>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| {
                state.products.get(&c.product_id).map(|p| CartLine { item: c.clone(), product: p.clone() })
            })
            .collect())
    }

    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        self.check_available()?;
        Ok(self.state.lock().await.coupons.get(code).cloned())
    }

    async fn record_coupon_redemption(&self, code: &str, order_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.coupons.contains_key(code) {
            return Err(StorefrontError::NotFound("Coupon"));
        }
        if !state.redemptions.insert((code.to_string(), order_id)) {
            return Ok(false);
        }
        if let Some(c) = state.coupons.get_mut(code) {
            c.used_count += 1;
        }
        Ok(true)
    }

    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<PlacedOrder> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if state.orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(StorefrontError::Conflict(format!("order number {} already exists", order.order_number)));
        }
        state.orders.push(order.clone());
        if self.fail_order_items.load(Ordering::SeqCst) {
            // Roll back the header written above.
            state.orders.retain(|o| o.id != order.id);
            return Err(StorefrontError::Storage("injected order item insert failure".to_string()));
        }
        state.order_items.extend_from_slice(items);
        Ok(PlacedOrder { order: order.clone(), items: items.to_vec() })
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderDetail>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).map(|o| OrderDetail {
            order: o.clone(),
            items: state
                .order_items
                .iter()
                .filter(|i| i.order_id == id)
                .map(|i| OrderLine { item: i.clone(), product: state.products.get(&i.product_id).cloned() })
                .collect(),
        }))
    }

    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| user_id.map_or(true, |u| o.user_id == u))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<Order>> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.orders.iter_mut().find(|o| o.id == id && o.status == from).map(|o| {
            o.status = to;
            if let Some(t) = tracking_number {
                o.tracking_number = Some(t.to_string());
            }
            o.updated_at = Utc::now();
            o.clone()
        }))
    }
}
