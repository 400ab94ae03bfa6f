mod common;

use accessory_storefront::domain::aggregates::{Coupon, OrderLineInput};
use accessory_storefront::services::StatusUpdate;
use accessory_storefront::{OrderStatus, PaymentMethod, PaymentStatus, StorefrontError};
use chrono::{Duration, Utc};
use common::{harness, money, order_request, seed_product, ADMIN};
use rust_decimal::Decimal;
use std::sync::atomic::Ordering;

fn line(product_id: uuid::Uuid, quantity: i32, price: Decimal) -> OrderLineInput {
    OrderLineInput { product_id, quantity, price }
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_clears_cart() {
    let h = harness();
    let case = seed_product(&h.store, "Leather Case", money(25000)).await;
    h.state.cart.add_to_cart("u1", case.id, 2).await.unwrap();

    let placed = h
        .state
        .orders
        .place_order("u1", order_request(vec![line(case.id, 2, money(25000))]))
        .await
        .unwrap();

    assert!(placed.order.order_number.starts_with("ORD-"));
    let digits: String = placed.order.order_number[4..].chars().take_while(char::is_ascii_digit).collect();
    assert!(!digits.is_empty());
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].quantity, 2);
    assert_eq!(placed.items[0].price.to_string(), "250.00");
    assert_eq!(h.store.cart_row_count("u1").await, 0);

    // Subtotal 500 is below the free-shipping threshold.
    assert_eq!(placed.order.subtotal, Decimal::from(500));
    assert_eq!(placed.order.shipping_fee, Decimal::from(99));
    assert_eq!(placed.order.total_amount, Decimal::from(599));

    h.store.set_product_price(case.id, money(99900)).await;
    let reread = h.state.orders.get_order("u1", placed.order.id).await.unwrap();
    assert_eq!(reread.items[0].item.price.to_string(), "250.00");
    assert_eq!(reread.items[0].product.as_ref().map(|p| p.price), Some(money(99900)));
    assert_eq!(reread.order.total_amount, Decimal::from(599));
}

#[tokio::test]
async fn order_lookup_survives_a_removed_product() {
    let h = harness();
    let case = seed_product(&h.store, "Leather Case", money(25000)).await;
    let placed = h.state.orders.place_order("u1", order_request(vec![line(case.id, 1, money(25000))])).await.unwrap();

    let detail = h.state.orders.get_order("u1", placed.order.id).await.unwrap();
    assert_eq!(detail.items[0].product.as_ref().map(|p| p.name.as_str()), Some("Leather Case"));

    h.store.remove_product(case.id).await;
    let detail = h.state.orders.get_order("u1", placed.order.id).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert!(detail.items[0].product.is_none());
    assert_eq!(detail.items[0].item.price, money(25000));
}

#[tokio::test]
async fn oversized_prices_are_rejected_before_any_write() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    h.state.cart.add_to_cart("u1", p.id, 1).await.unwrap();

    let huge = Decimal::from_scientific("7e28").unwrap();
    let err = h.state.orders.place_order("u1", order_request(vec![line(p.id, 2, huge)])).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref m) if m.contains("must not exceed")));

    // Each line fits, but the subtotal does not fit the order columns.
    let big = Decimal::from(60_000_000);
    let err = h.state.orders.place_order("u1", order_request(vec![line(p.id, 2, big)])).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref m) if m.contains("exceeds the maximum")));

    let err = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, Decimal::new(10005, 3))])).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref m) if m.contains("decimal places")));

    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.cart_row_count("u1").await, 1);
}

#[tokio::test]
async fn coupon_check_rejects_unstorable_amounts() {
    let h = harness();
    h.store.insert_coupon(Coupon::percentage("SAVE10", Decimal::from(10))).await;

    let huge = Decimal::from_scientific("1e28").unwrap();
    let err = h.state.coupons.validate("SAVE10", huge).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref m) if m.starts_with("amount")));
    assert!(matches!(h.state.coupons.validate("SAVE10", Decimal::new(-1, 0)).await, Err(StorefrontError::Validation(_))));

    let check = h.state.coupons.validate("SAVE10", Decimal::new(1005, 2)).await.unwrap();
    assert_eq!(check.discount, Some(Decimal::new(101, 2)));
}

#[tokio::test]
async fn order_numbers_are_unique() {
    let h = harness();
    let p = seed_product(&h.store, "Cable", money(10000)).await;
    let a = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();
    let b = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();
    assert_ne!(a.order.order_number, b.order.order_number);
}

#[tokio::test]
async fn online_payment_is_marked_completed() {
    let h = harness();
    let p = seed_product(&h.store, "Charger", money(120000)).await;
    let mut req = order_request(vec![line(p.id, 1, money(120000))]);
    req.payment_method = PaymentMethod::Online;
    let placed = h.state.orders.place_order("u1", req).await.unwrap();
    assert_eq!(placed.order.payment_status, PaymentStatus::Completed);
    assert_eq!(placed.order.shipping_fee, Decimal::ZERO);
}

#[tokio::test]
async fn empty_order_is_rejected_before_any_write() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    h.state.cart.add_to_cart("u1", p.id, 1).await.unwrap();

    let err = h.state.orders.place_order("u1", order_request(vec![])).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.cart_row_count("u1").await, 1);
}

#[tokio::test]
async fn item_insert_failure_leaves_no_orphan_and_keeps_cart() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    h.state.cart.add_to_cart("u1", p.id, 1).await.unwrap();
    h.store.fail_order_items.store(true, Ordering::SeqCst);

    let err = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Storage(_)));
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.order_item_count().await, 0);
    assert_eq!(h.store.cart_row_count("u1").await, 1);
}

#[tokio::test]
async fn cart_clear_failure_does_not_fail_the_order() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    h.state.cart.add_to_cart("u1", p.id, 1).await.unwrap();
    h.store.fail_cart_clear.store(true, Ordering::SeqCst);

    let placed = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();
    assert_eq!(h.store.order_count().await, 1);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(h.store.cart_row_count("u1").await, 1);
}

#[tokio::test]
async fn coupon_discount_is_applied_and_redeemed_once() {
    let h = harness();
    let mut save10 = Coupon::percentage("SAVE10", Decimal::from(10));
    save10.usage_limit = Some(5);
    h.store.insert_coupon(save10).await;
    let p = seed_product(&h.store, "Earbuds", Decimal::from(1000)).await;

    let mut req = order_request(vec![line(p.id, 1, Decimal::from(1000))]);
    req.coupon_code = Some("SAVE10".into());
    let placed = h.state.orders.place_order("u1", req).await.unwrap();

    assert_eq!(placed.order.discount_amount, Decimal::from(100));
    assert_eq!(placed.order.shipping_fee, Decimal::ZERO);
    assert_eq!(placed.order.total_amount, Decimal::from(900));
    assert_eq!(placed.order.coupon_code.as_deref(), Some("SAVE10"));

    // A retried redemption for the same order is not counted twice.
    assert!(!h.state.coupons.redeem("SAVE10", placed.order.id).await.unwrap());
    let check = h.state.coupons.validate("SAVE10", Decimal::from(1000)).await.unwrap();
    assert!(check.valid);
    let stored = accessory_storefront::StorefrontStore::get_coupon(h.store.as_ref(), "SAVE10").await.unwrap().unwrap();
    assert_eq!(stored.used_count, 1);
}

#[tokio::test]
async fn invalid_coupon_rejects_order() {
    let h = harness();
    let mut expired = Coupon::fixed("EXPIRED", Decimal::from(50));
    expired.valid_until = Some(Utc::now() - Duration::days(2));
    h.store.insert_coupon(expired).await;
    let p = seed_product(&h.store, "Case", money(10000)).await;

    let mut req = order_request(vec![line(p.id, 1, money(10000))]);
    req.coupon_code = Some("EXPIRED".into());
    let err = h.state.orders.place_order("u1", req).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref m) if m.contains("expired")));
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn oversized_fixed_discount_clamps_total_at_zero() {
    let h = harness();
    h.store.insert_coupon(Coupon::fixed("FLAT2000", Decimal::from(2000))).await;
    let p = seed_product(&h.store, "Case", Decimal::from(1000)).await;
    let mut req = order_request(vec![line(p.id, 1, Decimal::from(1000))]);
    req.coupon_code = Some("FLAT2000".into());
    let placed = h.state.orders.place_order("u1", req).await.unwrap();
    assert_eq!(placed.order.discount_amount, Decimal::from(2000));
    assert_eq!(placed.order.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn client_total_is_informational() {
    let h = harness();
    let p = seed_product(&h.store, "Case", Decimal::from(300)).await;
    let mut req = order_request(vec![line(p.id, 1, Decimal::from(300))]);
    req.total_amount = Some(Decimal::from(1));
    let placed = h.state.orders.place_order("u1", req).await.unwrap();
    assert_eq!(placed.order.total_amount, Decimal::from(399));
}

#[tokio::test]
async fn admin_drives_status_workflow() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    let placed = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();
    let id = placed.order.id;
    let to = |status| StatusUpdate { status, tracking_number: None };

    let err = h.state.orders.update_status(ADMIN, id, to(OrderStatus::Shipped)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));

    h.state.orders.update_status(ADMIN, id, to(OrderStatus::Confirmed)).await.unwrap();
    let shipped = h
        .state
        .orders
        .update_status(ADMIN, id, StatusUpdate { status: OrderStatus::Shipped, tracking_number: Some("AWB123".into()) })
        .await
        .unwrap();
    assert_eq!(shipped.tracking_number.as_deref(), Some("AWB123"));
    h.state.orders.update_status(ADMIN, id, to(OrderStatus::Delivered)).await.unwrap();

    let err = h.state.orders.update_status(ADMIN, id, to(OrderStatus::Cancelled)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    assert!(matches!(
        h.state.orders.update_status("u1", id, to(OrderStatus::Cancelled)).await,
        Err(StorefrontError::Forbidden)
    ));
}

#[tokio::test]
async fn orders_are_visible_to_owner_and_admin_only() {
    let h = harness();
    let p = seed_product(&h.store, "Case", money(10000)).await;
    let mine = h.state.orders.place_order("u1", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();
    h.state.orders.place_order("u2", order_request(vec![line(p.id, 1, money(10000))])).await.unwrap();

    assert_eq!(h.state.orders.list_orders("u1").await.unwrap().len(), 1);
    assert_eq!(h.state.orders.list_orders(ADMIN).await.unwrap().len(), 2);
    assert!(h.state.orders.get_order(ADMIN, mine.order.id).await.is_ok());
    assert!(matches!(h.state.orders.get_order("u2", mine.order.id).await, Err(StorefrontError::NotFound("Order"))));
}
