//! Order total computation
//!
//! Totals depend only on the line snapshots, the discount and the shipping
//! policy, never on the shipping address.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::aggregates::OrderLineInput;
use super::value_objects::max_amount;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self { free_shipping_threshold: Decimal::from(999), flat_fee: Decimal::from(99) }
    }
}

impl ShippingPolicy {
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold { Decimal::ZERO } else { self.flat_fee }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

/// Sum of price x quantity over the snapshot lines.
pub fn lines_subtotal(lines: &[OrderLineInput]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, l| {
        l.price
            .checked_mul(Decimal::from(l.quantity))
            .and_then(|line_total| acc.checked_add(line_total))
            .ok_or(PricingError::Overflow)
    })
}

impl OrderTotals {
    /// `max(0, subtotal - discount + shipping)`. The shipping threshold is
    /// judged on the pre-discount subtotal. Every stored amount must fit the
    /// money columns.
    pub fn compute(lines: &[OrderLineInput], discount: Decimal, policy: &ShippingPolicy) -> Result<Self, PricingError> {
        let subtotal = within_limit(lines_subtotal(lines)?)?;
        let discount = within_limit(discount)?;
        let shipping_fee = policy.fee_for(subtotal);
        let total = subtotal
            .checked_sub(discount)
            .and_then(|v| v.checked_add(shipping_fee))
            .ok_or(PricingError::Overflow)?
            .max(Decimal::ZERO);
        Ok(Self { subtotal, discount, shipping_fee, total: within_limit(total)? })
    }
}

fn within_limit(amount: Decimal) -> Result<Decimal, PricingError> {
    if amount > max_amount() { return Err(PricingError::ExceedsLimit(amount)); }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    Overflow,
    ExceedsLimit(Decimal),
}
impl std::error::Error for PricingError {}
impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "Order amount is too large"),
            Self::ExceedsLimit(v) => write!(f, "Order amount {} exceeds the maximum of {}", v, max_amount()),
        }
    }
}
