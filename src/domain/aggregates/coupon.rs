//! Coupon Aggregate
//!
//! [`Coupon::evaluate`] is a pure decision over the coupon record, the order
//! amount and the current time. It never touches `used_count`; usage is
//! accounted separately through redemptions keyed by order id.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "percentage", Self::Fixed => "fixed" }
    }
}

impl FromStr for DiscountType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!("unknown discount type '{}'", other)),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Outcome of a coupon check. An ineligible coupon is a regular response,
/// not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CouponValidation {
    pub fn accepted(discount: Decimal) -> Self { Self { valid: true, discount: Some(discount), message: None } }
    pub fn rejected(message: impl Into<String>) -> Self { Self { valid: false, discount: None, message: Some(message.into()) } }
    pub fn unknown_code() -> Self { Self::rejected("Invalid coupon code") }
}

impl Coupon {
    pub fn percentage(code: impl Into<String>, percent: Decimal) -> Self {
        Self::new(code, DiscountType::Percentage, percent)
    }

    pub fn fixed(code: impl Into<String>, amount: Decimal) -> Self {
        Self::new(code, DiscountType::Fixed, amount)
    }

    fn new(code: impl Into<String>, discount_type: DiscountType, discount_value: Decimal) -> Self {
        Self {
            code: code.into(), discount_type, discount_value,
            min_order_amount: None, max_discount_amount: None, usage_limit: None,
            used_count: 0, is_active: true, valid_until: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    /// Checks eligibility in a fixed order and stops at the first failure.
    pub fn evaluate(&self, amount: Decimal, now: DateTime<Utc>) -> CouponValidation {
        if !self.is_active {
            return CouponValidation::rejected("Coupon is no longer active");
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return CouponValidation::rejected("Coupon has expired");
        }
        if let Some(min) = self.min_order_amount {
            if amount < min {
                return CouponValidation::rejected(format!("Minimum order amount is ₹{}", min));
            }
        }
        if self.is_exhausted() {
            return CouponValidation::rejected("Coupon usage limit reached");
        }
        match self.discount_for(amount) {
            Some(discount) => CouponValidation::accepted(discount),
            None => CouponValidation::rejected("Order amount is too large for this coupon"),
        }
    }

    /// Fixed discounts are deliberately not capped at `amount`; the order
    /// total clamps at zero instead. Percentage discounts are rounded to
    /// paise. `None` if the arithmetic overflows.
    pub fn discount_for(&self, amount: Decimal) -> Option<Decimal> {
        match self.discount_type {
            DiscountType::Percentage => {
                let discount = amount
                    .checked_mul(self.discount_value)?
                    .checked_div(Decimal::ONE_HUNDRED)?
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                Some(match self.max_discount_amount {
                    Some(cap) => discount.min(cap),
                    None => discount,
                })
            }
            DiscountType::Fixed => Some(self.discount_value),
        }
    }
}

/// Validation entry point for a looked-up coupon (or its absence).
pub fn validate_coupon(coupon: Option<&Coupon>, amount: Decimal, now: DateTime<Utc>) -> CouponValidation {
    match coupon {
        None => CouponValidation::unknown_code(),
        Some(c) => c.evaluate(amount, now),
    }
}
