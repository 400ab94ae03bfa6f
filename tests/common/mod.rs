#![allow(dead_code)]

use accessory_storefront::domain::aggregates::{OrderLineInput, Product, ShippingAddress};
use accessory_storefront::http::AppState;
use accessory_storefront::services::{AllowListAdminGate, EventPublisher, PlaceOrder};
use accessory_storefront::store::{MemoryStore, StorefrontStore};
use accessory_storefront::{PaymentMethod, ShippingPolicy};
use rust_decimal::Decimal;
use std::sync::Arc;

pub const ADMIN: &str = "admin_1";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn StorefrontStore> = store.clone();
    let state = AppState::new(
        dyn_store,
        Arc::new(AllowListAdminGate::new([ADMIN])),
        ShippingPolicy::default(),
        EventPublisher::disabled(),
    );
    Harness { store, state }
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn seed_product(store: &MemoryStore, name: &str, price: Decimal) -> Product {
    let product = Product::new(name, price, 25);
    store.insert_product(product.clone()).await;
    product
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Meera Iyer".into(),
        phone_number: "9123456780".into(),
        address: "221 Residency Road".into(),
        city: "Chennai".into(),
        state: "TN".into(),
        pincode: "600001".into(),
        country: "India".into(),
    }
}

pub fn order_request(items: Vec<OrderLineInput>) -> PlaceOrder {
    PlaceOrder {
        items,
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        total_amount: None,
        coupon_code: None,
    }
}
