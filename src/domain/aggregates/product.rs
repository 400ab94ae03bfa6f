//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Catalog entry. Its price is the display price for cart lines; order lines
/// carry their own snapshot. Serializes with the derived `inStock` flag.
#[derive(Clone, Debug, PartialEq, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub brand: String,
    pub model: String,
    pub material: Option<String>,
    pub stock_quantity: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal, stock_quantity: i32) -> Self {
        Self {
            id: Uuid::now_v7(), name: name.into(), price, original_price: None,
            brand: String::new(), model: String::new(), material: None,
            stock_quantity, featured: false, created_at: Utc::now(),
        }
    }

    pub fn in_stock(&self) -> bool { self.stock_quantity > 0 }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductView<'a> {
    id: Uuid,
    name: &'a str,
    price: Decimal,
    original_price: Option<Decimal>,
    brand: &'a str,
    model: &'a str,
    material: Option<&'a str>,
    stock_quantity: i32,
    in_stock: bool,
    featured: bool,
    created_at: DateTime<Utc>,
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ProductView {
            id: self.id,
            name: &self.name,
            price: self.price,
            original_price: self.original_price,
            brand: &self.brand,
            model: &self.model,
            material: self.material.as_deref(),
            stock_quantity: self.stock_quantity,
            in_stock: self.in_stock(),
            featured: self.featured,
            created_at: self.created_at,
        }
        .serialize(serializer)
    }
}
