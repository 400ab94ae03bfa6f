//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod coupon;

pub use product::Product;
pub use order::{
    build_order_items, Order, OrderDetail, OrderError, OrderItem, OrderLine, OrderLineInput, OrderStatus, PaymentMethod,
    PaymentStatus, PlacedOrder, ShippingAddress,
};
pub use cart::{cart_subtotal, CartItem, CartLine};
pub use coupon::{validate_coupon, Coupon, CouponValidation, DiscountType};
