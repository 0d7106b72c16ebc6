//! Conversions between `NUMERIC` columns and the `f64` the pricing math uses.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::DbError;

/// Convert a value bound for a `NUMERIC` column.
///
/// # Errors
///
/// Returns [`DbError::InvalidValue`] for NaN, infinities, or magnitudes
/// `Decimal` cannot hold.
pub fn to_decimal(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value).ok_or_else(|| DbError::InvalidValue {
        field,
        reason: format!("{value} is not representable as NUMERIC"),
    })
}

/// Convert a value read from a `NUMERIC` column.
///
/// # Errors
///
/// Returns [`DbError::InvalidValue`] if the decimal has no `f64` equivalent.
pub fn to_f64(field: &'static str, value: Decimal) -> Result<f64, DbError> {
    value.to_f64().ok_or_else(|| DbError::InvalidValue {
        field,
        reason: format!("{value} does not fit in f64"),
    })
}
