//! # Validation Module
//!
//! Input checks run by callers before a calculation.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                     │
//! │  └── Form-level checks, immediate feedback                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Session gate (tally-session)                                  │
//! │  ├── Type validation (deserialization)                                  │
//! │  ├── THIS MODULE, blocking: cart size, finite numbers                   │
//! │  └── THIS MODULE, advisory: per-line rules (logged, never blocking)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing pipeline                                              │
//! │  └── Never validates; missing data becomes defaults                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_line_item, validate_precision};
//! use tally_core::LineItem;
//!
//! validate_line_item(&LineItem::new("P-1", 100.0, 2.0)).unwrap();
//! assert!(validate_precision(12).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{LineItem, TaxRule};
use crate::{MAX_CART_LINES, MAX_PRECISION};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

fn require_finite(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn require_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a percentage in `0..=100`.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_percentage;
///
/// assert!(validate_percentage("discount", 12.5).is_ok());
/// assert!(validate_percentage("discount", 100.0).is_ok());
/// assert!(validate_percentage("discount", 101.0).is_err());
/// assert!(validate_percentage("discount", f64::NAN).is_err());
/// ```
pub fn validate_percentage(field: &str, value: f64) -> ValidationResult<()> {
    require_finite(field, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 100.0,
            value,
        });
    }
    Ok(())
}

/// Validates the rounding precision (decimal places).
pub fn validate_precision(precision: u32) -> ValidationResult<()> {
    if precision > MAX_PRECISION {
        return Err(ValidationError::OutOfRange {
            field: "precision".to_string(),
            min: 0.0,
            max: f64::from(MAX_PRECISION),
            value: f64::from(precision),
        });
    }
    Ok(())
}

fn validate_tax_rule(field: &str, rule: &TaxRule) -> ValidationResult<()> {
    validate_percentage(&format!("{field}.totalTax"), rule.total_tax)?;
    for component in &rule.tax_req_ls {
        validate_percentage(&format!("{field}.{}", component.tax_name), component.rate)?;
    }
    Ok(())
}

// =============================================================================
// Line & Cart Validators
// =============================================================================

/// Checks that every number on a line is finite.
///
/// Negative prices (credit lines) and out-of-range percentages pass; only
/// NaN and infinities are rejected since they poison every cart total.
pub fn validate_line_numbers(line: &LineItem) -> ValidationResult<()> {
    require_finite("unitListPrice", line.unit_list_price)?;
    require_finite("quantity", line.quantity)?;
    if let Some(asked) = line.asked_quantity {
        require_finite("askedQuantity", asked)?;
    }
    require_finite("pfItemValue", line.pf_item_value)?;
    require_finite("productCost", line.product_cost)?;
    require_finite("addonCost", line.addon_cost)?;
    require_finite("shippingCharges", line.shipping_charges)?;
    require_finite("cashdiscountValue", line.cash_discount_value)?;
    if let Some(discount) = line.discount {
        require_finite("discount", discount)?;
    }
    if let Some(discount) = line.discount_percentage {
        require_finite("discountPercentage", discount)?;
    }
    if let Some(hsn) = &line.hsn_details {
        require_finite("hsnDetails.tax", hsn.tax)?;
        for (field, rule) in [("interTax", &hsn.inter_tax), ("intraTax", &hsn.intra_tax)] {
            if let Some(rule) = rule {
                require_finite(&format!("{field}.totalTax"), rule.total_tax)?;
                for component in &rule.tax_req_ls {
                    require_finite(&format!("{field}.{}", component.tax_name), component.rate)?;
                }
            }
        }
    }
    for component in &line.bundle_products {
        require_finite("bundleProducts.unitListPrice", component.unit_list_price)?;
    }
    Ok(())
}

/// Validates one line item against the catalog rules.
///
/// Advisory: the session logs a failure and still prices the line.
///
/// ## Rules
/// - `productId` must not be blank
/// - every number finite ([`validate_line_numbers`])
/// - `quantity`, costs and charges not negative (`unitListPrice` may be,
///   for credit lines)
/// - `discount` / `discountPercentage` within 0..=100
/// - every tax rate within 0..=100
pub fn validate_line_item(line: &LineItem) -> ValidationResult<()> {
    if line.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "productId".to_string(),
        });
    }

    validate_line_numbers(line)?;
    require_non_negative("quantity", line.quantity)?;
    require_non_negative("pfItemValue", line.pf_item_value)?;
    require_non_negative("productCost", line.product_cost)?;
    require_non_negative("addonCost", line.addon_cost)?;
    require_non_negative("shippingCharges", line.shipping_charges)?;

    if let Some(discount) = line.discount {
        validate_percentage("discount", discount)?;
    }
    if let Some(discount) = line.discount_percentage {
        validate_percentage("discountPercentage", discount)?;
    }

    if let Some(hsn) = &line.hsn_details {
        validate_percentage("hsnDetails.tax", hsn.tax)?;
        if let Some(rule) = &hsn.inter_tax {
            validate_tax_rule("interTax", rule)?;
        }
        if let Some(rule) = &hsn.intra_tax {
            validate_tax_rule("intraTax", rule)?;
        }
    }

    Ok(())
}

/// Validates what a calculation cannot recover from: line count and
/// non-finite numbers.
///
/// ## Rules
/// - Must not exceed [`MAX_CART_LINES`]
/// - Every line passes [`validate_line_numbers`]
pub fn validate_cart(lines: &[LineItem]) -> ValidationResult<()> {
    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_CART_LINES,
        });
    }

    lines.iter().try_for_each(validate_line_numbers)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HsnDetails, TaxComponent};

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage("discount", 0.0).is_ok());
        assert!(validate_percentage("discount", 18.0).is_ok());
        assert!(validate_percentage("discount", 100.0).is_ok());

        assert!(validate_percentage("discount", -0.5).is_err());
        assert!(validate_percentage("discount", 100.01).is_err());
        assert!(validate_percentage("discount", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_precision() {
        assert!(validate_precision(0).is_ok());
        assert!(validate_precision(2).is_ok());
        assert!(validate_precision(MAX_PRECISION).is_ok());
        assert!(validate_precision(MAX_PRECISION + 1).is_err());
    }

    #[test]
    fn test_validate_line_item() {
        assert!(validate_line_item(&LineItem::new("P-1", 100.0, 1.0)).is_ok());

        assert_eq!(
            validate_line_item(&LineItem::new("  ", 100.0, 1.0)),
            Err(ValidationError::Required {
                field: "productId".to_string()
            })
        );
        assert!(validate_line_item(&LineItem::new("CREDIT", -1.0, 1.0)).is_ok());
        assert!(validate_line_item(&LineItem::new("P-1", f64::NAN, 1.0)).is_err());
        assert!(validate_line_item(&LineItem::new("P-1", 10.0, -2.0)).is_err());

        let mut discounted = LineItem::new("P-1", 100.0, 1.0);
        discounted.discount = Some(150.0);
        assert!(validate_line_item(&discounted).is_err());
    }

    #[test]
    fn test_validate_tax_rates() {
        let mut line = LineItem::new("P-1", 100.0, 1.0);
        line.hsn_details = Some(HsnDetails {
            tax: 18.0,
            intra_tax: Some(TaxRule {
                total_tax: 18.0,
                tax_req_ls: vec![TaxComponent {
                    tax_name: "CGST".into(),
                    rate: 180.0,
                    compound: false,
                }],
            }),
            ..HsnDetails::default()
        });

        let err = validate_line_item(&line).unwrap_err();
        assert_eq!(
            err.to_string(),
            "intraTax.CGST must be between 0 and 100, got 180"
        );
    }

    #[test]
    fn test_validate_cart_size() {
        let lines = vec![LineItem::new("P-1", 1.0, 1.0); MAX_CART_LINES];
        assert!(validate_cart(&lines).is_ok());

        let too_many = vec![LineItem::new("P-1", 1.0, 1.0); MAX_CART_LINES + 1];
        assert!(matches!(
            validate_cart(&too_many),
            Err(ValidationError::TooMany { .. })
        ));
        assert!(validate_cart(&[]).is_ok());
    }

    #[test]
    fn test_validate_cart_only_blocks_non_finite() {
        let mut over_discounted = LineItem::new("", -50.0, 1.0);
        over_discounted.discount = Some(120.0);
        assert!(validate_line_item(&over_discounted).is_err());
        assert!(validate_cart(&[over_discounted]).is_ok());

        let mut broken = LineItem::new("P-1", 10.0, 1.0);
        broken.pf_item_value = f64::INFINITY;
        assert!(matches!(
            validate_cart(&[LineItem::new("P-2", 1.0, 1.0), broken]),
            Err(ValidationError::NotFinite { field, .. }) if field == "pfItemValue"
        ));
    }
}
