//! Application services over a [`StorefrontStore`](crate::store::StorefrontStore)
pub mod access;
pub mod cart;
pub mod coupons;
pub mod events;
pub mod orders;

pub use access::{AdminGate, AllowListAdminGate};
pub use cart::CartService;
pub use coupons::CouponService;
pub use events::EventPublisher;
pub use orders::{OrderService, PlaceOrder, StatusUpdate};
