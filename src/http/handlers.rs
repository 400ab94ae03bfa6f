use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, AppState, AuthUser};
use crate::domain::aggregates::{CartItem, CartLine, CouponValidation, Order, OrderDetail, PlacedOrder};
use crate::services::{PlaceOrder, StatusUpdate};
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: Uuid, pub quantity: Option<i32> }

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest { pub quantity: i32 }

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest { pub code: String, pub amount: Decimal }

pub(super) async fn get_cart(State(s): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(s.cart.list(&user).await?))
}

pub(super) async fn add_to_cart(State(s): State<AppState>, AuthUser(user): AuthUser, ApiJson(r): ApiJson<AddToCartRequest>) -> Result<Json<CartItem>> {
    Ok(Json(s.cart.add_to_cart(&user, r.product_id, r.quantity.unwrap_or(1)).await?))
}

pub(super) async fn update_cart_item(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>, ApiJson(r): ApiJson<UpdateCartRequest>) -> Result<Json<CartItem>> {
    Ok(Json(s.cart.update_quantity(&user, id, r.quantity).await?))
}

pub(super) async fn remove_cart_item(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.cart.remove_item(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn clear_cart(State(s): State<AppState>, AuthUser(user): AuthUser) -> Result<StatusCode> {
    s.cart.clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn validate_coupon(State(s): State<AppState>, ApiJson(r): ApiJson<ValidateCouponRequest>) -> Result<Json<CouponValidation>> {
    Ok(Json(s.coupons.validate(&r.code, r.amount).await?))
}

pub(super) async fn create_order(State(s): State<AppState>, AuthUser(user): AuthUser, ApiJson(r): ApiJson<PlaceOrder>) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = s.orders.place_order(&user, r).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

pub(super) async fn list_orders(State(s): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_orders(&user).await?))
}

pub(super) async fn get_order(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>) -> Result<Json<OrderDetail>> {
    Ok(Json(s.orders.get_order(&user, id).await?))
}

pub(super) async fn update_order_status(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>, ApiJson(r): ApiJson<StatusUpdate>) -> Result<Json<Order>> {
    Ok(Json(s.orders.update_status(&user, id, r).await?))
}
