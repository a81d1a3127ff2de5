//! # Line Item Normalizer
//!
//! Turns raw catalog/quote lines into fully priced lines ready for
//! aggregation.
//!
//! ## Per-Line Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw line                                                               │
//! │     │                                                                   │
//! │     ├─► quantity / packaging synonyms                                   │
//! │     ├─► MOQ aliases, checkMOQ                                           │
//! │     ├─► discountPercentage ◄── discount                                 │
//! │     ├─► snapshot initial list price (first run only)                    │
//! │     ├─► discountedPrice, snapshot initial discounted price              │
//! │     ├─► unitPrice / bundle re-pricing / totalPrice   (skipped when a    │
//! │     │   volume discount is already applied)                             │
//! │     ├─► tax-inclusive back-out                                          │
//! │     ├─► tax, pfRate, dmc / margin, tax breakups                         │
//! │     ├─► price unavailable? zero every price field                       │
//! │     └─► shippingCharges = 0                                             │
//! │                                                                         │
//! │  priced line (new value, input untouched)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `totalPrice` is taken after the tax-inclusive back-out, so it is always
//! `quantity × unitPrice` on the final unit price. The aggregator recomputes
//! it from the same unit price.

use tracing::debug;

use crate::money::{apply_discount, back_out_tax, percent_of, round_to};
use crate::tax;
use crate::types::LineItem;

/// Normalizes every line. Returns new lines; `lines` is not modified.
pub fn normalize_lines(lines: &[LineItem], tax_exempt: bool, precision: u32) -> Vec<LineItem> {
    debug!(lines = lines.len(), tax_exempt, precision, "Normalizing line items");
    lines
        .iter()
        .map(|line| normalize_line(line, tax_exempt, precision))
        .collect()
}

/// Normalizes one line.
pub fn normalize_line(source: &LineItem, tax_exempt: bool, precision: u32) -> LineItem {
    let mut line = source.clone();
    line.resolve_quantity_aliases();

    // Minimum order quantity
    line.min_order_quantity = line.min_order_quantity.or(line.packaging_qty);
    line.check_moq = line.min_order_quantity.unwrap_or(0.0) > line.quantity;

    // Discount aliases
    let discount_pct = line.discount_pct();
    line.discount_percentage = Some(discount_pct);

    let initial_list_price = *line.initial_unit_list_price.get_or_insert(line.unit_list_price);

    line.discounted_price = apply_discount(line.unit_list_price, discount_pct);
    let initial_discounted = *line
        .initial_discounted_price
        .get_or_insert(line.discounted_price);

    line.tax = if tax_exempt { 0.0 } else { line.hsn_tax() };

    if !line.volume_discount_applied {
        line.discount = Some(discount_pct);
        line.unit_price = line.discounted_price;

        if !line.bundle_products.is_empty() {
            apply_bundle_pricing(&mut line, initial_list_price, initial_discounted, discount_pct);
        }

        if line.tax_inclusive {
            line.unit_price = back_out_tax(line.unit_price, line.tax);
        }

        line.total_price = line.quantity * line.unit_price;
    }

    if line.show_price || line.price_not_available {
        line.pf_rate = round_to(percent_of(line.total_price, line.pf_item_value), precision);
    }

    let margin_price = line.unit_price;
    apply_margin(&mut line, margin_price, precision);

    let (inter, intra) = tax::resolve_breakups(&line, tax_exempt);
    line.inter_tax_breakup = inter;
    line.intra_tax_breakup = intra;

    line.unit_lp = line.unit_list_price;
    line.unit_lp_rp = line.unit_list_price;

    if line.is_price_unavailable() {
        zero_prices(&mut line);
    }

    line.shipping_charges = 0.0;
    line
}

/// Re-prices a bundled parent against its deselected components.
///
/// List price drops by each deselected component's list price; unit price
/// drops by each deselected component's price at the parent's discount.
fn apply_bundle_pricing(
    line: &mut LineItem,
    initial_list_price: f64,
    initial_discounted: f64,
    discount_pct: f64,
) {
    let (removed_list, removed_discounted) = line
        .bundle_products
        .iter()
        .filter(|component| !component.is_selected())
        .fold((0.0, 0.0), |(list, discounted), component| {
            (
                list + component.unit_list_price,
                discounted + apply_discount(component.unit_list_price, discount_pct),
            )
        });

    line.unit_list_price = initial_list_price - removed_list;
    line.discounted_price = apply_discount(line.unit_list_price, discount_pct);
    line.unit_price = initial_discounted - removed_discounted;
}

/// Sets `dmc` (cost as a percentage of `price`) and `marginPercentage`.
pub(crate) fn apply_margin(line: &mut LineItem, price: f64, precision: u32) {
    let cost = line.product_cost + line.addon_cost;
    line.dmc = if cost > 0.0 && price > 0.0 {
        round_to(cost / price * 100.0, precision)
    } else {
        100.0
    };
    line.margin_percentage = 100.0 - line.dmc;
}

fn zero_prices(line: &mut LineItem) {
    line.discounted_price = 0.0;
    line.buyer_requested_price = 0.0;
    line.unit_price = 0.0;
    line.unit_lp = 0.0;
    line.unit_list_price = 0.0;
    line.total_price = 0.0;
}

// =============================================================================
// Unit Tests
// =============================================================================
