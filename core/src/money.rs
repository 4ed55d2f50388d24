// shopflow/src/money.rs

//! Decimal helpers for currency amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CommerceError, Result};

const DECIMAL_PLACES: u32 = 2;

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percentage / 100`, unrounded.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Decimal {
  amount * percentage / Decimal::ONE_HUNDRED
}

/// Converts a major-unit amount into the integer minor units gateways expect.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
  (round2(amount) * Decimal::ONE_HUNDRED)
    .trunc()
    .to_i64()
    .ok_or_else(|| CommerceError::Validation(format!("amount {amount} is out of range")))
}

pub fn is_valid_percentage(value: Decimal) -> bool {
  value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED
}
