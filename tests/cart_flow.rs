mod common;

use accessory_storefront::StorefrontError;
use common::{harness, money, seed_product};
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[tokio::test]
async fn adding_same_product_twice_merges_quantities() {
    let h = harness();
    let case = seed_product(&h.store, "Silicone Case", money(49900)).await;

    let first = h.state.cart.add_to_cart("u1", case.id, 2).await.unwrap();
    let second = h.state.cart.add_to_cart("u1", case.id, 3).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 5);
    assert_eq!(h.store.cart_row_count("u1").await, 1);
    let lines = h.state.cart.list("u1").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product.name, "Silicone Case");
}

#[tokio::test]
async fn carts_are_per_user() {
    let h = harness();
    let cable = seed_product(&h.store, "USB-C Cable", money(29900)).await;
    h.state.cart.add_to_cart("u1", cable.id, 1).await.unwrap();
    h.state.cart.add_to_cart("u2", cable.id, 1).await.unwrap();
    assert_eq!(h.store.cart_row_count("u1").await, 1);
    assert_eq!(h.store.cart_row_count("u2").await, 1);
}

#[tokio::test]
async fn concurrent_adds_do_not_lose_updates() {
    let h = harness();
    let glass = seed_product(&h.store, "Tempered Glass", money(19900)).await.id;
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let cart = h.state.cart.clone();
            tokio::spawn(async move { cart.add_to_cart("u1", glass, 1).await })
        })
        .collect();
    for t in tasks {
        t.await.unwrap().unwrap();
    }
    let lines = h.state.cart.list("u1").await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item.quantity, 10);
}

#[tokio::test]
async fn add_rejects_bad_quantity_and_unknown_product() {
    let h = harness();
    let case = seed_product(&h.store, "Case", money(10000)).await;
    assert!(matches!(h.state.cart.add_to_cart("u1", case.id, 0).await, Err(StorefrontError::Validation(_))));
    assert!(matches!(
        h.state.cart.add_to_cart("u1", Uuid::now_v7(), 1).await,
        Err(StorefrontError::NotFound("Product"))
    ));
    assert_eq!(h.store.cart_row_count("u1").await, 0);
}

#[tokio::test]
async fn merged_quantity_overflow_is_rejected() {
    let h = harness();
    let case = seed_product(&h.store, "Case", money(10000)).await;
    h.state.cart.add_to_cart("u1", case.id, i32::MAX).await.unwrap();

    let err = h.state.cart.add_to_cart("u1", case.id, 1).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    let lines = h.state.cart.list("u1").await.unwrap();
    assert_eq!(lines[0].item.quantity, i32::MAX);
}

#[tokio::test]
async fn update_quantity_below_one_is_rejected_and_state_unchanged() {
    let h = harness();
    let case = seed_product(&h.store, "Case", money(10000)).await;
    let item = h.state.cart.add_to_cart("u1", case.id, 2).await.unwrap();

    for bad in [0, -1] {
        let err = h.state.cart.update_quantity("u1", item.id, bad).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
    }
    let lines = h.state.cart.list("u1").await.unwrap();
    assert_eq!(lines[0].item.quantity, 2);

    let updated = h.state.cart.update_quantity("u1", item.id, 7).await.unwrap();
    assert_eq!(updated.quantity, 7);
}

#[tokio::test]
async fn unknown_or_foreign_items_are_not_found() {
    let h = harness();
    let case = seed_product(&h.store, "Case", money(10000)).await;
    let item = h.state.cart.add_to_cart("u1", case.id, 1).await.unwrap();

    assert!(matches!(h.state.cart.update_quantity("u1", Uuid::now_v7(), 1).await, Err(StorefrontError::NotFound(_))));
    assert!(matches!(h.state.cart.update_quantity("u2", item.id, 3).await, Err(StorefrontError::NotFound(_))));
    assert!(matches!(h.state.cart.remove_item("u2", item.id).await, Err(StorefrontError::NotFound(_))));
    assert_eq!(h.store.cart_row_count("u1").await, 1);

    h.state.cart.remove_item("u1", item.id).await.unwrap();
    assert_eq!(h.store.cart_row_count("u1").await, 0);
    assert!(matches!(h.state.cart.remove_item("u1", item.id).await, Err(StorefrontError::NotFound(_))));
}

#[tokio::test]
async fn clear_removes_only_that_users_rows() {
    let h = harness();
    let a = seed_product(&h.store, "A", money(100)).await;
    let b = seed_product(&h.store, "B", money(200)).await;
    h.state.cart.add_to_cart("u1", a.id, 1).await.unwrap();
    h.state.cart.add_to_cart("u1", b.id, 1).await.unwrap();
    h.state.cart.add_to_cart("u2", a.id, 1).await.unwrap();

    assert_eq!(h.state.cart.clear("u1").await.unwrap(), 2);
    assert_eq!(h.store.cart_row_count("u1").await, 0);
    assert_eq!(h.store.cart_row_count("u2").await, 1);
}

#[tokio::test]
async fn storage_failures_surface_as_dependency_errors() {
    let h = harness();
    h.store.unavailable.store(true, Ordering::SeqCst);
    let err = h.state.cart.list("u1").await.unwrap_err();
    assert_eq!(err.kind(), "dependency");
}
