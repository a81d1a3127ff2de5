//! # Shipping & Tax Breakdown
//!
//! Last stage of a calculation: folds shipping into the cart totals and
//! lays the totals out as display rows.
//!
//! ## Breakup Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Subtotal                                   totalValue                  │
//! │  Packing & Forwarding                       pfRate          (if > 0)    │
//! │  Shipping                                   overallShipping (if > 0)    │
//! │  CGST                                       taxTotals[..]   (each)      │
//! │  SGST                                                                   │
//! │  Shipping Tax                               before-tax only (if > 0)    │
//! │  Insurance                                  insuranceCharges (if > 0)   │
//! │  Rounding Adjustment                        when rounding is on         │
//! │  ───────────────────────────────────────────────────────────────────    │
//! │  Grand Total                                grandTotal                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers with their own layout implement [`ShippingTaxBreakdown`] and hand
//! it to [`crate::CartCalculator::with_breakdown`].

use serde::{Deserialize, Serialize};
use tally_core::money::{percent_of, round_to};
use tally_core::{CartValue, LineItem, Settings};
use ts_rs::TS;

/// One display row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BreakupEntry {
    /// Stable key for the front end.
    pub key: String,
    pub label: String,
    pub amount: f64,
}

impl BreakupEntry {
    fn new(key: impl Into<String>, label: impl Into<String>, amount: f64) -> Self {
        BreakupEntry {
            key: key.into(),
            label: label.into(),
            amount,
        }
    }
}

/// Inputs of a breakdown.
#[derive(Debug, Clone, Copy)]
pub struct BreakdownRequest<'a> {
    pub overall_shipping: f64,
    pub cart_value: &'a CartValue,
    pub lines: &'a [LineItem],
    pub before_tax: bool,
    pub before_tax_percentage: f64,
    pub is_inter: bool,
    pub precision: u32,
    pub settings: Settings,
}

/// Cart totals including shipping, the lines, and the display rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown {
    pub cart_value: CartValue,
    pub products: Vec<LineItem>,
    pub breakup: Vec<BreakupEntry>,
}

/// Formats priced carts for display.
pub trait ShippingTaxBreakdown {
    fn breakdown(&self, request: BreakdownRequest<'_>) -> Breakdown;
}

/// Default breakdown.
///
/// Before-tax shipping is taxed at `beforeTaxPercentage` (cart-wide) or at
/// each line's `tax` rate on its own shipping (item-wise), and counts toward
/// the taxable amount. After-tax shipping is added to the total untaxed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBreakdown;

impl StandardBreakdown {
    fn shipping_tax(request: &BreakdownRequest<'_>) -> f64 {
        if !request.before_tax {
            return 0.0;
        }

        let tax = if request.settings.item_wise_shipping_tax {
            request
                .lines
                .iter()
                .map(|line| percent_of(line.shipping_charges * line.quantity, line.tax))
                .sum()
        } else {
            percent_of(request.overall_shipping, request.before_tax_percentage)
        };
        round_to(tax, request.precision)
    }
}

impl ShippingTaxBreakdown for StandardBreakdown {
    fn breakdown(&self, request: BreakdownRequest<'_>) -> Breakdown {
        let precision = request.precision;
        let shipping = request.overall_shipping;
        let shipping_tax = Self::shipping_tax(&request);

        let mut cart = request.cart_value.clone();
        cart.total_shipping = shipping;
        if request.before_tax {
            cart.taxable_amount += shipping;
        }
        cart.total_tax += shipping_tax;
        cart.calculated_total += shipping + shipping_tax;
        let (grand_total, adjustment) = request.settings.reconcile(cart.calculated_total);
        cart.grand_total = grand_total;
        cart.rounding_adjustment = adjustment;

        let mut breakup = vec![BreakupEntry::new(
            "subTotal",
            "Subtotal",
            round_to(cart.total_value, precision),
        )];
        if cart.pf_rate > 0.0 {
            breakup.push(BreakupEntry::new(
                "pfRate",
                "Packing & Forwarding",
                round_to(cart.pf_rate, precision),
            ));
        }
        if shipping > 0.0 {
            breakup.push(BreakupEntry::new(
                "shipping",
                "Shipping",
                round_to(shipping, precision),
            ));
        }
        for total in &cart.tax_totals {
            breakup.push(BreakupEntry::new(
                total.tax_name.clone(),
                total.tax_name.clone(),
                round_to(total.amount, precision),
            ));
        }
        if shipping_tax > 0.0 {
            breakup.push(BreakupEntry::new("shippingTax", "Shipping Tax", shipping_tax));
        }
        if cart.insurance_charges > 0.0 {
            breakup.push(BreakupEntry::new(
                "insurance",
                "Insurance",
                round_to(cart.insurance_charges, precision),
            ));
        }
        if request.settings.rounding_adjustment {
            breakup.push(BreakupEntry::new(
                "roundingAdjustment",
                "Rounding Adjustment",
                round_to(cart.rounding_adjustment, precision),
            ));
        }
        breakup.push(BreakupEntry::new(
            "grandTotal",
            "Grand Total",
            round_to(cart.grand_total, precision),
        ));

        Breakdown {
            cart_value: cart,
            products: request.lines.to_vec(),
            breakup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::money::approx_eq;
    use tally_core::TaxTotal;

    fn cart() -> CartValue {
        CartValue {
            total_items: 1,
            total_value: 1000.0,
            total_tax: 180.0,
            tax_totals: vec![
                TaxTotal {
                    tax_name: "CGST".into(),
                    amount: 90.0,
                },
                TaxTotal {
                    tax_name: "SGST".into(),
                    amount: 90.0,
                },
            ],
            taxable_amount: 1000.0,
            calculated_total: 1180.0,
            grand_total: 1180.0,
            ..CartValue::default()
        }
    }

    fn request<'a>(cart: &'a CartValue, lines: &'a [LineItem]) -> BreakdownRequest<'a> {
        BreakdownRequest {
            overall_shipping: 0.0,
            cart_value: cart,
            lines,
            before_tax: false,
            before_tax_percentage: 0.0,
            is_inter: false,
            precision: 2,
            settings: Settings::default(),
        }
    }

    fn keys(breakup: &[BreakupEntry]) -> Vec<&str> {
        breakup.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_rows_without_shipping() {
        let cart = cart();
        let out = StandardBreakdown.breakdown(request(&cart, &[]));
        assert_eq!(keys(&out.breakup), ["subTotal", "CGST", "SGST", "grandTotal"]);
        assert_eq!(out.cart_value.grand_total, 1180.0);
    }

    #[test]
    fn test_before_tax_shipping_is_taxed() {
        let cart = cart();
        let out = StandardBreakdown.breakdown(BreakdownRequest {
            overall_shipping: 100.0,
            before_tax: true,
            before_tax_percentage: 18.0,
            ..request(&cart, &[])
        });

        assert!(approx_eq(out.cart_value.taxable_amount, 1100.0));
        assert!(approx_eq(out.cart_value.total_tax, 198.0));
        assert!(approx_eq(out.cart_value.grand_total, 1298.0));
        assert_eq!(
            keys(&out.breakup),
            ["subTotal", "shipping", "CGST", "SGST", "shippingTax", "grandTotal"]
        );
    }

    #[test]
    fn test_after_tax_shipping_is_untaxed() {
        let cart = cart();
        let out = StandardBreakdown.breakdown(BreakdownRequest {
            overall_shipping: 50.0,
            before_tax_percentage: 18.0,
            ..request(&cart, &[])
        });
        assert!(approx_eq(out.cart_value.taxable_amount, 1000.0));
        assert!(approx_eq(out.cart_value.grand_total, 1230.0));
    }

    #[test]
    fn test_item_wise_shipping_tax_uses_line_rates() {
        let cart = cart();
        let mut line = LineItem::new("P-1", 500.0, 2.0);
        line.tax = 12.0;
        line.shipping_charges = 25.0;
        let lines = [line];
        let out = StandardBreakdown.breakdown(BreakdownRequest {
            overall_shipping: 50.0,
            before_tax: true,
            settings: Settings {
                item_wise_shipping_tax: true,
                ..Settings::default()
            },
            ..request(&cart, &lines)
        });
        assert!(approx_eq(out.cart_value.total_tax, 186.0));
        assert_eq!(out.products.len(), 1);
    }

    #[test]
    fn test_rounding_row() {
        let mut cart = cart();
        cart.calculated_total = 1180.4;
        let out = StandardBreakdown.breakdown(BreakdownRequest {
            settings: Settings {
                rounding_adjustment: true,
                ..Settings::default()
            },
            ..request(&cart, &[])
        });
        assert_eq!(out.cart_value.grand_total, 1180.0);
        let rounding = out
            .breakup
            .iter()
            .find(|e| e.key == "roundingAdjustment")
            .unwrap();
        assert!(approx_eq(rounding.amount, -0.4));
    }
}
