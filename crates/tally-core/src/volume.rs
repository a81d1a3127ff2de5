//! # Volume Discount Engine
//!
//! Re-prices lines against tiered volume discounts and produces an
//! alternate cart total ([`VdDetails`]).
//!
//! ## Two Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_volume_discount            calculate_volume_discount             │
//! │  ─────────────────────            ─────────────────────────             │
//! │  offers supplied by the caller    offer attached to each line           │
//! │  (VdData matched on itemNo)       (volumeDiscountObj tiers,             │
//! │                                    CantCombine gate, discChanged)       │
//! │  always returns an outcome        Result<_, PartialFailure>             │
//! │            │                                 │                          │
//! │            └──────────────┬──────────────────┘                          │
//! │                           ▼                                             │
//! │                     VolumePass (shared)                                 │
//! │  appliedDiscount = volume% + base%                                      │
//! │  unitPrice → totalPrice → pfRate → tax walk (+ shipping tax mode)       │
//! │  shadow unitVolumePrice / margin                                        │
//! │  VdDetails summary                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shipping Tax Modes (before-tax shipping only)
//! - cart-wide (`itemWiseShippingTax = false`): once, `overallShipping ×
//!   beforeTaxPercentage / 100`, after every line is priced
//! - per item (`itemWiseShippingTax = true`): each line's `shippingCharges ×
//!   quantity` walked through the line's own breakup, compound components
//!   levied on that line's shipping taxes only
//!
//! ## Degrade Policy
//! A non-finite intermediate value stops the pass. The [`PartialFailure`]
//! carries the summary of the lines priced so far; the remaining lines are
//! passed through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::VolumeFault;
use crate::money::{apply_discount, back_out_tax, per_unit, percent_of, round_to};
use crate::normalize::apply_margin;
use crate::settings::Settings;
use crate::tax::{self, Jurisdiction, TaxWalk};
use crate::types::{add_tax_total, LineItem, TaxTotal};

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// Externally supplied volume discount for one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct VdData {
    pub item_no: String,
    /// Percentage unlocked for the line.
    pub volume_discount: f64,
}

/// Cart-level parameters of a volume discount pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeParams {
    /// Subtotal before volume discounts (usually `CartValue::total_value`).
    pub sub_total: f64,
    pub overall_shipping: f64,
    /// Shipping is charged before tax (and therefore taxed).
    pub before_tax: bool,
    /// Shipping tax rate for the cart-wide mode.
    pub before_tax_percentage: f64,
    pub precision: u32,
    pub is_inter: bool,
    pub insurance_charges: f64,
    pub tax_exempt: bool,
}

/// Summary of a volume discount pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct VdDetails {
    pub sub_total: f64,
    pub sub_total_volume: f64,
    /// `subTotal − subTotalVolume`.
    pub volume_discount_applied: f64,
    pub overall_tax: f64,
    pub shipping_tax: f64,
    pub pf_rate: f64,
    pub overall_shipping: f64,
    pub taxable_amount: f64,
    pub insurance_charges: f64,
    pub calculated_total: f64,
    pub grand_total: f64,
    pub rounding_adjustment: f64,
    pub tax_totals: Vec<TaxTotal>,
}

/// Re-priced lines with their summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeOutcome {
    pub lines: Vec<LineItem>,
    pub vd_details: VdDetails,
    pub pf_rate: f64,
}

/// A pass that stopped early, with everything computed before the fault.
#[derive(Debug, Error)]
#[error("volume discount stopped after {processed} of {total} lines: {fault}")]
pub struct PartialFailure {
    #[source]
    pub fault: VolumeFault,
    pub processed: usize,
    pub total: usize,
    pub outcome: VolumeOutcome,
}

impl PartialFailure {
    /// Accepts the best-effort result.
    pub fn into_outcome(self) -> VolumeOutcome {
        self.outcome
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Re-prices `lines` with offers matched on `itemNo`. Lines without a
/// matching offer are re-priced at their base discount.
///
/// Never fails: a fault degrades to the partial outcome.
pub fn apply_volume_discount(
    lines: &[LineItem],
    offers: &[VdData],
    params: &VolumeParams,
    settings: &Settings,
) -> VolumeOutcome {
    run_pass(lines, params, settings, |line| offer_for_item(offers, line))
        .unwrap_or_else(PartialFailure::into_outcome)
}

/// Re-prices `lines` with the offer attached to each line.
pub fn calculate_volume_discount(
    lines: &[LineItem],
    params: &VolumeParams,
    settings: &Settings,
) -> Result<VolumeOutcome, PartialFailure> {
    run_pass(lines, params, settings, attached_offer_percentage)
}

/// Percentage from the caller-supplied offers for this line's `itemNo`.
pub fn offer_for_item(offers: &[VdData], line: &LineItem) -> f64 {
    let Some(item_no) = line.item_no.as_deref() else {
        return 0.0;
    };
    offers
        .iter()
        .find(|offer| offer.item_no == item_no)
        .map_or(0.0, |offer| offer.volume_discount)
}

/// Percentage from the line's own `volumeDiscountObj`.
///
/// An offer that cannot combine with other discounts yields 0 when the line
/// already carries a base discount, unless the discount was changed by hand.
pub fn attached_offer_percentage(line: &LineItem) -> f64 {
    let Some(offer) = line.volume_discount_obj.as_ref() else {
        return 0.0;
    };

    if offer.cant_combine_with_other_discounts && line.discount_pct() > 0.0 && !line.disc_changed
    {
        return 0.0;
    }

    offer.discount_for(line.quantity)
}

fn run_pass(
    lines: &[LineItem],
    params: &VolumeParams,
    settings: &Settings,
    mut percentage: impl FnMut(&LineItem) -> f64,
) -> Result<VolumeOutcome, PartialFailure> {
    debug!(
        lines = lines.len(),
        before_tax = params.before_tax,
        item_wise_shipping_tax = settings.item_wise_shipping_tax,
        "Running volume discount pass"
    );

    let mut pass = VolumePass::new(params, settings, lines.len());

    for (index, line) in lines.iter().enumerate() {
        let volume_pct = percentage(line);
        if let Err(fault) = pass.reprice(line, volume_pct) {
            warn!(
                item = line.label(),
                processed = index,
                error = %fault,
                "Volume discount pass degraded to partial result"
            );
            let mut outcome = pass.finish(false);
            outcome.lines.extend(lines[index..].iter().cloned());
            return Err(PartialFailure {
                fault,
                processed: index,
                total: lines.len(),
                outcome,
            });
        }
    }

    Ok(pass.finish(true))
}

// =============================================================================
// Volume Pass
// =============================================================================

struct VolumePass<'a> {
    params: &'a VolumeParams,
    settings: &'a Settings,
    jurisdiction: Jurisdiction,
    lines: Vec<LineItem>,
    sub_total_volume: f64,
    overall_tax: f64,
    shipping_tax: f64,
    pf_rate: f64,
    tax_totals: Vec<TaxTotal>,
}

impl<'a> VolumePass<'a> {
    fn new(params: &'a VolumeParams, settings: &'a Settings, capacity: usize) -> Self {
        VolumePass {
            params,
            settings,
            jurisdiction: Jurisdiction::from_is_inter(params.is_inter),
            lines: Vec::with_capacity(capacity),
            sub_total_volume: 0.0,
            overall_tax: 0.0,
            shipping_tax: 0.0,
            pf_rate: 0.0,
            tax_totals: Vec::new(),
        }
    }

    fn item_wise_shipping(&self) -> bool {
        self.params.before_tax && self.settings.item_wise_shipping_tax
    }

    fn reprice(&mut self, source: &LineItem, volume_pct: f64) -> Result<(), VolumeFault> {
        let precision = self.params.precision;
        let tax_exempt = self.params.tax_exempt;
        let mut line = source.clone();

        line.applied_discount = volume_pct + line.discount_pct();
        let mut unit_price = round_to(
            apply_discount(line.unit_list_price, line.applied_discount),
            precision,
        );
        if line.tax_inclusive {
            unit_price = round_to(back_out_tax(unit_price, line.tax), precision);
        }
        line.unit_price = ensure_finite(&line, "unitPrice", unit_price)?;
        line.total_price = ensure_finite(&line, "totalPrice", line.quantity * line.unit_price)?;
        line.pf_rate = round_to(percent_of(line.total_price, line.pf_item_value), precision);

        let base = line.tax_base();
        line.tax_volume_discount_percentage = round_to(percent_of(base, line.tax), precision);

        let item_wise_shipping = self.item_wise_shipping();
        line.item_taxable_amount = line.unit_price + per_unit(line.pf_rate, line.quantity);
        if item_wise_shipping {
            line.item_taxable_amount += line.shipping_charges;
        }

        let (inter, intra) = tax::resolve_breakups(&line, tax_exempt);
        line.inter_tax_breakup = inter;
        line.intra_tax_breakup = intra;

        let mut walk = match self.jurisdiction {
            Jurisdiction::Inter => tax::walk_taxes(&line.inter_tax_breakup, base),
            Jurisdiction::Intra => tax::walk_taxes(&line.intra_tax_breakup, base),
        };
        let product_tax = tax::line_total_tax(&line, &walk, self.jurisdiction, base, tax_exempt);
        let line_shipping_tax = if item_wise_shipping {
            add_item_shipping_tax(&mut walk, line.shipping_charges * line.quantity)
        } else {
            0.0
        };

        for component in &walk.components {
            add_tax_total(&mut self.tax_totals, &component.tax_name, component.value);
        }
        line.total_tax = ensure_finite(&line, "totalTax", product_tax + line_shipping_tax)?;
        line.tax_components = walk.components;

        if volume_pct > 0.0 {
            line.volume_discount_applied = true;
            line.volume_discount = volume_pct;
            line.unit_volume_price = round_to(
                apply_discount(line.unit_list_price, volume_pct),
                precision,
            );
            line.total_volume_discount_price = line.unit_volume_price * line.quantity;
            let shadow_price = line.unit_volume_price;
            apply_margin(&mut line, shadow_price, precision);
        } else {
            line.volume_discount_applied = false;
            line.volume_discount = 0.0;
            line.unit_volume_price = 0.0;
            line.total_volume_discount_price = 0.0;
        }
        line.buyer_requested_price = line.unit_price;

        self.sub_total_volume += line.total_price;
        self.overall_tax += line.total_tax;
        self.shipping_tax += line_shipping_tax;
        self.pf_rate += line.pf_rate;
        self.lines.push(line);
        Ok(())
    }

    fn finish(mut self, complete: bool) -> VolumeOutcome {
        let params = self.params;

        if complete && params.before_tax && !self.settings.item_wise_shipping_tax {
            let cart_shipping_tax = round_to(
                percent_of(params.overall_shipping, params.before_tax_percentage),
                params.precision,
            );
            self.shipping_tax += cart_shipping_tax;
            self.overall_tax += cart_shipping_tax;
        }

        let mut taxable_amount = self.sub_total_volume + self.pf_rate;
        if params.before_tax {
            taxable_amount += params.overall_shipping;
        }
        let calculated_total = self.sub_total_volume
            + self.overall_tax
            + self.pf_rate
            + params.overall_shipping
            + params.insurance_charges;
        let (grand_total, rounding_adjustment) = self.settings.reconcile(calculated_total);

        VolumeOutcome {
            vd_details: VdDetails {
                sub_total: params.sub_total,
                sub_total_volume: self.sub_total_volume,
                volume_discount_applied: params.sub_total - self.sub_total_volume,
                overall_tax: self.overall_tax,
                shipping_tax: self.shipping_tax,
                pf_rate: self.pf_rate,
                overall_shipping: params.overall_shipping,
                taxable_amount,
                insurance_charges: params.insurance_charges,
                calculated_total,
                grand_total,
                rounding_adjustment,
                tax_totals: self.tax_totals,
            },
            pf_rate: self.pf_rate,
            lines: self.lines,
        }
    }
}

/// Walks a line's shipping through its breakup, adding each shipping tax
/// into the matching component. Returns the line's shipping tax.
fn add_item_shipping_tax(walk: &mut TaxWalk, shipping: f64) -> f64 {
    let mut shipping_compound = 0.0;
    let mut shipping_tax = 0.0;

    for component in &mut walk.components {
        let value = if component.compound {
            percent_of(shipping_compound, component.tax_percentage)
        } else {
            let value = percent_of(shipping, component.tax_percentage);
            shipping_compound += value;
            value
        };
        component.value += value;
        shipping_tax += value;
    }

    shipping_tax
}

fn ensure_finite(line: &LineItem, field: &'static str, value: f64) -> Result<f64, VolumeFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VolumeFault::NonFinite {
            item: line.label().to_string(),
            field,
            value,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
