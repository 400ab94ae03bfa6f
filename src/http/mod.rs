//! HTTP surface
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::pricing::ShippingPolicy;
use crate::services::{AdminGate, CartService, CouponService, EventPublisher, OrderService};
use crate::store::StorefrontStore;

pub mod auth;
pub mod error;
pub mod extract;
mod handlers;

pub use auth::{AuthUser, USER_ID_HEADER};
pub use extract::ApiJson;

#[derive(Clone)]
pub struct AppState {
    pub cart: CartService,
    pub coupons: CouponService,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StorefrontStore>,
        admin: Arc<dyn AdminGate>,
        shipping: ShippingPolicy,
        events: EventPublisher,
    ) -> Self {
        let coupons = CouponService::new(store.clone(), events.clone());
        Self {
            cart: CartService::new(store.clone()),
            orders: OrderService::new(store, coupons.clone(), admin, shipping, events),
            coupons,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/cart", get(handlers::get_cart).post(handlers::add_to_cart).delete(handlers::clear_cart))
        .route("/cart/:id", put(handlers::update_cart_item).delete(handlers::remove_cart_item))
        .route("/coupons/validate", post(handlers::validate_coupon))
        .route("/orders", get(handlers::list_orders).post(handlers::create_order))
        .route("/orders/:id", get(handlers::get_order))
        .route("/orders/:id/status", put(handlers::update_order_status));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "accessory-storefront"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
