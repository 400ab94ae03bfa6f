//! Value Objects for the storefront

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cart / order line quantity. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::BelowOne(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> i32 { self.0 }
    /// `None` once the sum no longer fits the `INTEGER` quantity column.
    pub fn checked_add(&self, other: Quantity) -> Option<Self> { self.0.checked_add(other.0).map(Self) }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> i32 { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { BelowOne(i32) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::BelowOne(v) => write!(f, "Quantity must be at least 1 (got {})", v) }
    }
}

/// Largest amount the `NUMERIC(10, 2)` money columns hold.
pub fn max_amount() -> Decimal { Decimal::new(9_999_999_999, 2) }

/// Accepts a client-supplied money amount only if the money columns can
/// store it exactly.
pub fn check_amount(value: Decimal) -> Result<Decimal, AmountError> {
    if value < Decimal::ZERO { return Err(AmountError::Negative); }
    if value.normalize().scale() > 2 { return Err(AmountError::TooPrecise); }
    if value > max_amount() { return Err(AmountError::TooLarge); }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError { Negative, TooPrecise, TooLarge }
impl std::error::Error for AmountError {}
impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "must not be negative"),
            Self::TooPrecise => write!(f, "must have at most 2 decimal places"),
            Self::TooLarge => write!(f, "must not exceed {}", max_amount()),
        }
    }
}

/// Human-facing order reference, `ORD-<unix millis>-<9 base36 chars>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

impl OrderNumber {
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self::generate_with(now, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("ORD-{}-{}", now.timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
