//! # Cart Aggregator
//!
//! Sums normalized lines into a [`CartValue`], applying the cash discount
//! overlay and rounding reconciliation on the way.
//!
//! ## Aggregation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each normalized line                                               │
//! │     │                                                                   │
//! │     ├─► cash discount overlay (originalUnitPrice snapshot, once)        │
//! │     ├─► itemNo from the injected ItemNoSource when absent               │
//! │     ├─► pfRate, itemTaxableAmount                                       │
//! │     ├─► tax walk (inter or intra breakup) → taxTotals                   │
//! │     ├─► prodTax, totalLP, cash / basic discount tracking                │
//! │     ├─► accumulate value, tax, shipping, pf                             │
//! │     └─► refresh taxableAmount / calculatedTotal / grandTotal            │
//! │                                                                         │
//! │  flags: negative totals, price list coverage                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cash Discount Idempotence
//! `originalUnitPrice` is captured the first time a cash discount is seen
//! and never overwritten while the discount stays active, so aggregating
//! the aggregator's own output yields the same unit prices.

use chrono::Utc;
use tracing::debug;

use crate::money::{apply_discount, per_unit, percent_of, round_to};
use crate::settings::Settings;
use crate::tax::{self, Jurisdiction};
use crate::types::{add_tax_total, CartValue, LineItem};

// =============================================================================
// Item Numbers
// =============================================================================

/// Supplies `itemNo` for lines that arrive without one.
pub trait ItemNoSource {
    /// Item number for the line at `index` in the current pass.
    fn next_item_no(&mut self, index: usize) -> String;
}

/// Deterministic counter. The default starts at 1.
#[derive(Debug, Clone)]
pub struct SequentialItemNo {
    next: u64,
}

impl SequentialItemNo {
    pub fn starting_at(first: u64) -> Self {
        SequentialItemNo { next: first }
    }
}

impl Default for SequentialItemNo {
    fn default() -> Self {
        SequentialItemNo::starting_at(1)
    }
}

impl ItemNoSource for SequentialItemNo {
    fn next_item_no(&mut self, _index: usize) -> String {
        let item_no = self.next;
        self.next += 1;
        item_no.to_string()
    }
}

/// Wall-clock milliseconds plus line index, matching item numbers already
/// stored by older quotes. Not deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampItemNo;

impl ItemNoSource for TimestampItemNo {
    fn next_item_no(&mut self, index: usize) -> String {
        (Utc::now().timestamp_millis() + index as i64).to_string()
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Per-call parameters of the aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartContext {
    pub is_inter: bool,
    pub insurance_charges: f64,
    pub precision: u32,
    pub tax_exempt: bool,
}

/// Lines after aggregation plus the cart totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<LineItem>,
    pub cart_value: CartValue,
}

/// Aggregates normalized lines into cart totals.
///
/// An empty slice yields a zeroed [`CartValue`]. `lines` is not modified.
pub fn aggregate_cart(
    lines: &[LineItem],
    ctx: &CartContext,
    settings: &Settings,
    item_nos: &mut dyn ItemNoSource,
) -> PricedCart {
    if lines.is_empty() {
        return PricedCart::default();
    }

    debug!(lines = lines.len(), is_inter = ctx.is_inter, "Aggregating cart");

    let precision = ctx.precision;
    let jurisdiction = Jurisdiction::from_is_inter(ctx.is_inter);
    let mut cart = CartValue {
        insurance_charges: ctx.insurance_charges,
        ..CartValue::default()
    };
    let mut priced = Vec::with_capacity(lines.len());

    for (index, source) in lines.iter().enumerate() {
        let mut line = source.clone();

        apply_cash_discount(&mut line);
        if !line.volume_discount_applied {
            line.total_price = line.quantity * line.unit_price;
        }

        if line.item_no.is_none() {
            line.item_no = Some(item_nos.next_item_no(index));
        }

        line.pf_rate = round_to(percent_of(line.total_price, line.pf_item_value), precision);
        line.item_taxable_amount = line.unit_price + per_unit(line.pf_rate, line.quantity);

        let (inter, intra) = tax::resolve_breakups(&line, ctx.tax_exempt);
        line.inter_tax_breakup = inter;
        line.intra_tax_breakup = intra;

        let base = line.tax_base();
        let walk = match jurisdiction {
            Jurisdiction::Inter => tax::walk_taxes(&line.inter_tax_breakup, base),
            Jurisdiction::Intra => tax::walk_taxes(&line.intra_tax_breakup, base),
        };
        for component in &walk.components {
            add_tax_total(&mut cart.tax_totals, &component.tax_name, component.value);
        }
        line.total_tax = tax::line_total_tax(&line, &walk, jurisdiction, base, ctx.tax_exempt);
        line.tax_components = walk.components;

        line.prod_tax = round_to(percent_of(base, line.tax), precision);
        line.total_lp = line.unit_list_price * line.quantity;
        line.buyer_requested_price = line.unit_price;

        if line.cash_discount_value > 0.0 {
            let original = line.original_unit_price.unwrap_or(line.unit_price);
            line.cash_discounted_price =
                round_to((original - line.unit_price) * line.quantity, precision);
            cart.total_cash_discount += line.cash_discounted_price;
            cart.cash_discount_value = line.cash_discount_value;
        } else {
            line.cash_discounted_price = 0.0;
        }

        line.basic_discounted_price = if line.unit_list_price > line.unit_price {
            (line.unit_list_price - line.unit_price) * line.quantity
        } else {
            0.0
        };
        cart.total_basic_discount += line.basic_discounted_price;

        cart.total_items += 1;
        cart.total_shipping += line.shipping_charges * line.quantity;
        cart.total_lp += line.total_lp;
        cart.total_tax += line.total_tax;
        cart.total_value += line.total_price;
        cart.pf_rate += line.pf_rate;
        if line.list_price_public == Some(false) {
            cart.hide_list_price_public = true;
        }

        refresh_totals(&mut cart, settings);
        priced.push(line);
    }

    cart.has_products_with_negative_total_price = priced.iter().any(|l| l.total_price < 0.0);
    cart.has_all_products_available_in_price_list =
        priced.iter().all(|l| l.is_product_available_in_price_list);

    PricedCart {
        lines: priced,
        cart_value: cart,
    }
}

/// Applies (or lifts) the cash discount overlay on one line.
///
/// Active discount: `unitPrice = original − original × pct / 100`, where
/// `original` is captured once. Lifted discount: the captured price is
/// restored and the snapshot cleared.
pub fn apply_cash_discount(line: &mut LineItem) {
    if line.cash_discount_value > 0.0 {
        let original = *line.original_unit_price.get_or_insert(line.unit_price);
        line.unit_price = apply_discount(original, line.cash_discount_value);
    } else if let Some(original) = line.original_unit_price.take() {
        line.unit_price = original;
    }
}

/// Recomputes the derived cart totals from the running accumulators.
pub fn refresh_totals(cart: &mut CartValue, settings: &Settings) {
    cart.taxable_amount = cart.total_value + cart.pf_rate;
    cart.calculated_total =
        cart.total_tax + cart.total_value + cart.pf_rate + cart.insurance_charges;
    let (grand_total, adjustment) = settings.reconcile(cart.calculated_total);
    cart.grand_total = grand_total;
    cart.rounding_adjustment = adjustment;
}

/// Spreads `overall_shipping` over the priced units as per-unit
/// `shippingCharges`.
///
/// Every unit of a line with a shown price and a positive quantity carries
/// the same share, so `Σ shippingCharges × quantity == overall_shipping`.
/// Other lines get 0. Nothing changes when no unit qualifies.
pub fn allocate_item_shipping(lines: &mut [LineItem], overall_shipping: f64) {
    let carries_shipping = |line: &LineItem| line.quantity > 0.0 && !line.is_price_unavailable();
    let units: f64 = lines
        .iter()
        .filter(|line| carries_shipping(line))
        .map(|line| line.quantity)
        .sum();
    if units <= 0.0 {
        return;
    }

    let share = per_unit(overall_shipping, units);
    debug!(overall_shipping, units, share, "Allocating item-wise shipping");
    for line in lines.iter_mut() {
        line.shipping_charges = if carries_shipping(line) { share } else { 0.0 };
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
