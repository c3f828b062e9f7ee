use crate::error::{ChannelError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

const MINOR_UNITS: Decimal = Decimal::ONE_HUNDRED;

/// Renders `amount` with exactly two decimals, rounding half away from zero.
pub fn fixed2(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Renders `amount` without trailing zeros (`10.50` -> `10.5`).
pub fn normalized(amount: Decimal) -> String {
    amount.normalize().to_string()
}

fn out_of_range(amount: Decimal) -> ChannelError {
    ChannelError::ValidationError(format!("amount {amount} is out of range"))
}

/// `amount` expressed in cents, sub-cent digits kept.
pub fn scaled_to_minor_units(amount: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(MINOR_UNITS)
        .ok_or_else(|| out_of_range(amount))
}

/// Converts a canonical amount into integer cents, truncating sub-cent digits.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    scaled_to_minor_units(amount)?
        .trunc()
        .to_i64()
        .ok_or_else(|| out_of_range(amount))
}

/// Converts an amount reported in cents back into the canonical unit.
pub fn from_minor_units(minor: Decimal) -> Decimal {
    minor / MINOR_UNITS
}

fn parse_decimal(raw: &str) -> std::result::Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw))
}

/// Accepts a decimal encoded either as a JSON number or a JSON string.
///
/// Providers are inconsistent about quoting amounts. Null and empty strings
/// decode as zero.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Decimal::ZERO),
        Value::Number(number) => {
            parse_decimal(&number.to_string()).map_err(serde::de::Error::custom)
        }
        Value::String(raw) if raw.trim().is_empty() => Ok(Decimal::ZERO),
        Value::String(raw) => parse_decimal(raw.trim()).map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected a decimal amount, got {other}"
        ))),
    }
}
