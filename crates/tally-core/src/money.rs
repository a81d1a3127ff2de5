//! # Money Module
//!
//! Rounding and percentage helpers shared by every pricing stage.
//!
//! ## Why f64 at the Boundary?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PRICES ARRIVE AS JSON NUMBERS                                          │
//! │                                                                         │
//! │  The front end sends list prices, discounts and tax rates as plain     │
//! │  numbers, and the number of decimal places is a per-tenant setting     │
//! │  (`precision`), not a fixed 2.                                          │
//! │                                                                         │
//! │  OUR APPROACH:                                                          │
//! │    • Arithmetic stays in f64 (same shape as the payload)               │
//! │    • Every value that is DISPLAYED or RECONCILED goes through          │
//! │      `round_to`, which converts to Decimal and rounds half away       │
//! │      from zero, so 0.005 → 0.01 regardless of binary representation  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{apply_discount, round_to};
//!
//! let discounted = apply_discount(200.0, 12.5); // 175.0
//! assert_eq!(round_to(discounted / 3.0, 2), 58.33);
//! ```

use rust_decimal::prelude::*;

/// Tolerance used when comparing computed amounts.
pub const AMOUNT_TOLERANCE: f64 = 1e-6;

/// Rounds `value` to `precision` decimal places, half away from zero.
///
/// Non-finite values are returned unchanged so that callers which check for
/// faults (the volume discount engine) can still see them.
///
/// ## Example
/// ```rust
/// use tally_core::money::round_to;
///
/// assert_eq!(round_to(1.005, 2), 1.01);
/// assert_eq!(round_to(-2.5, 0), -3.0);
/// assert_eq!(round_to(10.0 / 3.0, 3), 3.333);
/// ```
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    match Decimal::from_f64(value) {
        Some(decimal) => decimal
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(value),
        // Outside Decimal's range: fall back to float rounding
        None => {
            let factor = 10f64.powi(precision as i32);
            (value * factor).round() / factor
        }
    }
}

/// Rounds to the nearest whole currency unit (grand total reconciliation).
#[inline]
pub fn round_to_unit(value: f64) -> f64 {
    round_to(value, 0)
}

/// `amount × pct / 100`.
#[inline]
pub fn percent_of(amount: f64, pct: f64) -> f64 {
    amount * pct / 100.0
}

/// Applies a percentage discount: `amount − amount × pct / 100`.
///
/// ## Example
/// ```rust
/// use tally_core::money::apply_discount;
///
/// assert_eq!(apply_discount(100.0, 10.0), 90.0);
/// assert_eq!(apply_discount(100.0, 0.0), 100.0);
/// ```
#[inline]
pub fn apply_discount(amount: f64, pct: f64) -> f64 {
    amount - percent_of(amount, pct)
}

/// Removes an included tax from a tax-inclusive price: `amount / (1 + tax/100)`.
#[inline]
pub fn back_out_tax(amount: f64, tax_pct: f64) -> f64 {
    amount / (1.0 + tax_pct / 100.0)
}

/// Per-unit share of an amount, zero when the quantity is zero.
#[inline]
pub fn per_unit(amount: f64, quantity: f64) -> f64 {
    if quantity == 0.0 {
        0.0
    } else {
        amount / quantity
    }
}

/// Compares two amounts within [`AMOUNT_TOLERANCE`].
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < AMOUNT_TOLERANCE
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(0.005, 2), 0.01);
        assert_eq!(round_to(0.004, 2), 0.0);
        assert_eq!(round_to(-0.005, 2), -0.01);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_round_respects_precision() {
        assert_eq!(round_to(1234.56789, 0), 1235.0);
        assert_eq!(round_to(1234.56789, 1), 1234.6);
        assert_eq!(round_to(1234.56789, 3), 1234.568);
    }

    #[test]
    fn test_round_passes_non_finite_through() {
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn test_round_huge_values_fall_back() {
        let huge = 1e30;
        assert!(((round_to(huge, 2) - huge) / huge).abs() < 1e-12);
    }

    #[test]
    fn test_percentages() {
        assert_eq!(percent_of(200.0, 18.0), 36.0);
        assert_eq!(apply_discount(1000.0, 10.0), 900.0);
        assert!(approx_eq(back_out_tax(118.0, 18.0), 100.0));
    }

    #[test]
    fn test_per_unit_zero_quantity() {
        assert_eq!(per_unit(50.0, 0.0), 0.0);
        assert_eq!(per_unit(50.0, 5.0), 10.0);
    }
}
