use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::StorefrontStore;
use crate::domain::aggregates::{
    CartItem, CartLine, Coupon, Order, OrderDetail, OrderItem, OrderLine, OrderStatus, PlacedOrder, Product,
    ShippingAddress,
};
use crate::domain::value_objects::Quantity;
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let db = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await.map_err(storage_err)?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await.map_err(|e| StorefrontError::Storage(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool { &self.db }
}

fn storage_err(e: sqlx::Error) -> StorefrontError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorefrontError::Conflict(db.message().to_string());
        }
    }
    StorefrontError::Storage(e.to_string())
}

/// SQLSTATE `numeric_value_out_of_range`.
const OUT_OF_RANGE: &str = "22003";

fn cart_quantity_err(e: sqlx::Error) -> StorefrontError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(OUT_OF_RANGE) {
            return StorefrontError::validation("Cart quantity is too large");
        }
    }
    storage_err(e)
}

fn redemption_err(e: sqlx::Error) -> StorefrontError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            return StorefrontError::NotFound("Coupon");
        }
    }
    storage_err(e)
}

fn corrupt(column: &str, detail: String) -> StorefrontError {
    StorefrontError::Storage(format!("invalid {} in database: {}", column, detail))
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    code: String, discount_type: String, discount_value: Decimal,
    min_order_amount: Option<Decimal>, max_discount_amount: Option<Decimal>,
    usage_limit: Option<i32>, used_count: i32, is_active: bool, valid_until: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = StorefrontError;
    fn try_from(r: CouponRow) -> Result<Self> {
        Ok(Coupon {
            discount_type: r.discount_type.parse().map_err(|e| corrupt("discount_type", e))?,
            code: r.code, discount_value: r.discount_value, min_order_amount: r.min_order_amount,
            max_discount_amount: r.max_discount_amount, usage_limit: r.usage_limit,
            used_count: r.used_count, is_active: r.is_active, valid_until: r.valid_until,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, order_number: String, user_id: String, status: String,
    subtotal: Decimal, discount_amount: Decimal, shipping_fee: Decimal, total_amount: Decimal,
    coupon_code: Option<String>, payment_method: String, payment_status: String,
    shipping_address: Json<ShippingAddress>, tracking_number: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StorefrontError;
    fn try_from(r: OrderRow) -> Result<Self> {
        Ok(Order {
            status: r.status.parse().map_err(|e| corrupt("status", e))?,
            payment_method: r.payment_method.parse().map_err(|e| corrupt("payment_method", e))?,
            payment_status: r.payment_status.parse().map_err(|e| corrupt("payment_status", e))?,
            id: r.id, order_number: r.order_number, user_id: r.user_id,
            subtotal: r.subtotal, discount_amount: r.discount_amount, shipping_fee: r.shipping_fee,
            total_amount: r.total_amount, coupon_code: r.coupon_code,
            shipping_address: r.shipping_address.0, tracking_number: r.tracking_number,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItem,
    p_name: String, p_price: Decimal, p_original_price: Option<Decimal>, p_brand: String,
    p_model: String, p_material: Option<String>, p_stock_quantity: i32, p_featured: bool,
    p_created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(r: CartLineRow) -> Self {
        let product = Product {
            id: r.item.product_id, name: r.p_name, price: r.p_price, original_price: r.p_original_price,
            brand: r.p_brand, model: r.p_model, material: r.p_material,
            stock_quantity: r.p_stock_quantity, featured: r.p_featured, created_at: r.p_created_at,
        };
        CartLine { item: r.item, product }
    }
}

const CART_LINE_SELECT: &str = "SELECT c.id, c.user_id, c.product_id, c.quantity, c.created_at, \
    p.name AS p_name, p.price AS p_price, p.original_price AS p_original_price, p.brand AS p_brand, \
    p.model AS p_model, p.material AS p_material, p.stock_quantity AS p_stock_quantity, \
    p.featured AS p_featured, p.created_at AS p_created_at \
    FROM cart_items c JOIN products p ON p.id = c.product_id WHERE c.user_id = $1";

#[async_trait]
impl StorefrontStore for PgStore {
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await.map_err(storage_err)
    }

    async fn upsert_cart_item(&self, user_id: &str, product_id: Uuid, quantity: Quantity) -> Result<CartItem> {
        sqlx::query_as::<_, CartItem>("INSERT INTO cart_items (id, user_id, product_id, quantity, created_at) VALUES ($1, $2, $3, $4, NOW()) ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity RETURNING id, user_id, product_id, quantity, created_at")
            .bind(Uuid::now_v7()).bind(user_id).bind(product_id).bind(quantity.value())
            .fetch_one(&self.db).await.map_err(cart_quantity_err)
    }

    async fn set_cart_quantity(&self, user_id: &str, id: Uuid, quantity: Quantity) -> Result<Option<CartItem>> {
        sqlx::query_as::<_, CartItem>("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 RETURNING id, user_id, product_id, quantity, created_at")
            .bind(id).bind(user_id).bind(quantity.value())
            .fetch_optional(&self.db).await.map_err(storage_err)
    }

    async fn delete_cart_item(&self, user_id: &str, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id).bind(user_id).execute(&self.db).await.map_err(storage_err)?;
        Ok(done.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64> {
        let done = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id).execute(&self.db).await.map_err(storage_err)?;
        Ok(done.rows_affected())
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartLineRow>(CART_LINE_SELECT)
            .bind(user_id).fetch_all(&self.db).await.map_err(storage_err)?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1")
            .bind(code).fetch_optional(&self.db).await.map_err(storage_err)?
            .map(Coupon::try_from).transpose()
    }

    async fn record_coupon_redemption(&self, code: &str, order_id: Uuid) -> Result<bool> {
        let mut tx = self.db.begin().await.map_err(storage_err)?;
        let inserted = sqlx::query("INSERT INTO coupon_redemptions (coupon_code, order_id, redeemed_at) VALUES ($1, $2, NOW()) ON CONFLICT (coupon_code, order_id) DO NOTHING")
            .bind(code).bind(order_id).execute(&mut *tx).await
            .map_err(redemption_err)?;
        if inserted.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE code = $1")
            .bind(code).execute(&mut *tx).await.map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;
        Ok(true)
    }

    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<PlacedOrder> {
        // Dropping `tx` on any early return rolls the header back.
        let mut tx = self.db.begin().await.map_err(storage_err)?;
        let row = sqlx::query_as::<_, OrderRow>("INSERT INTO orders (id, order_number, user_id, status, subtotal, discount_amount, shipping_fee, total_amount, coupon_code, payment_method, payment_status, shipping_address, tracking_number, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING *")
            .bind(order.id).bind(&order.order_number).bind(&order.user_id).bind(order.status.as_str())
            .bind(order.subtotal).bind(order.discount_amount).bind(order.shipping_fee).bind(order.total_amount)
            .bind(&order.coupon_code).bind(order.payment_method.as_str()).bind(order.payment_status.as_str())
            .bind(Json(&order.shipping_address)).bind(&order.tracking_number).bind(order.created_at).bind(order.updated_at)
            .fetch_one(&mut *tx).await.map_err(storage_err)?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO order_items (id, order_id, product_id, quantity, price) ");
        qb.push_values(items, |mut b, item| {
            b.push_bind(item.id).push_bind(item.order_id).push_bind(item.product_id).push_bind(item.quantity).push_bind(item.price);
        });
        qb.push(" RETURNING id, order_id, product_id, quantity, price");
        let items = qb.build_query_as::<OrderItem>().fetch_all(&mut *tx).await.map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(PlacedOrder { order: Order::try_from(row)?, items })
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderDetail>> {
        let Some(row) = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await.map_err(storage_err)?
        else {
            return Ok(None);
        };
        let items = sqlx::query_as::<_, OrderItem>("SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1")
            .bind(id).fetch_all(&self.db).await.map_err(storage_err)?;
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(&product_ids).fetch_all(&self.db).await.map_err(storage_err)?
            .into_iter().map(|p| (p.id, p)).collect();
        let items = items
            .into_iter()
            .map(|item| OrderLine { product: products.get(&item.product_id).cloned(), item })
            .collect();
        Ok(Some(OrderDetail { order: Order::try_from(row)?, items }))
    }

    async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>> {
        let rows = match user_id {
            Some(u) => sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC").bind(u).fetch_all(&self.db).await,
            None => sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC").fetch_all(&self.db).await,
        }
        .map_err(storage_err)?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $3, tracking_number = COALESCE($4, tracking_number), updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING *")
            .bind(id).bind(from.as_str()).bind(to.as_str()).bind(tracking_number)
            .fetch_optional(&self.db).await.map_err(storage_err)?
            .map(Order::try_from).transpose()
    }
}
