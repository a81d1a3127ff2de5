//! # Pricing Settings
//!
//! Tenant-level switches recognized by the engine.
//!
//! | Option | Effect |
//! |--------|--------|
//! | `roundingAdjustment` | Round the grand total to the nearest whole unit |
//! | `itemWiseShippingTax` | Volume engine taxes shipping per line instead of once per cart |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::round_to_unit;

/// Settings object passed alongside every calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Round the grand total to the nearest integer.
    #[serde(alias = "rounding_adjustment")]
    pub rounding_adjustment: bool,

    /// Distribute shipping tax per item rather than cart-wide.
    #[serde(alias = "item_wise_shipping_tax")]
    pub item_wise_shipping_tax: bool,
}

impl Settings {
    /// Reconciles a calculated total into `(grand_total, rounding_adjustment)`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::Settings;
    ///
    /// let settings = Settings { rounding_adjustment: true, ..Settings::default() };
    /// let (grand, adjustment) = settings.reconcile(1234.567);
    /// assert_eq!(grand, 1235.0);
    /// assert!((adjustment - 0.433).abs() < 1e-9);
    /// ```
    pub fn reconcile(&self, calculated_total: f64) -> (f64, f64) {
        let grand_total = if self.rounding_adjustment {
            round_to_unit(calculated_total)
        } else {
            calculated_total
        };
        (grand_total, grand_total - calculated_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_without_rounding() {
        let (grand, adjustment) = Settings::default().reconcile(99.99);
        assert_eq!(grand, 99.99);
        assert_eq!(adjustment, 0.0);
    }

    #[test]
    fn test_reconcile_rounds_down() {
        let settings = Settings {
            rounding_adjustment: true,
            ..Settings::default()
        };
        let (grand, adjustment) = settings.reconcile(100.2);
        assert_eq!(grand, 100.0);
        assert!((adjustment + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_settings_accept_both_casings() {
        let camel: Settings =
            serde_json::from_str(r#"{"roundingAdjustment":true,"itemWiseShippingTax":true}"#)
                .unwrap();
        let snake: Settings =
            serde_json::from_str(r#"{"rounding_adjustment":true,"item_wise_shipping_tax":true}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert!(camel.item_wise_shipping_tax);
    }
}
