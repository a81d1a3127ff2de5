//! # Tax Breakup Resolver
//!
//! Expands a line's HSN tax rules into ordered breakups and walks them to
//! compute per-component amounts.
//!
//! ## Compound Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source taxReqLs            Resolved breakup                            │
//! │  ───────────────            ────────────────                            │
//! │  CESS   (compound, 10%) ─┐  GST  (18%)        ← non-compound first      │
//! │  GST    (18%)            ├► CESS (10%, cmp)   ← compound moved last     │
//! │                          │                                              │
//! │  Walk on base B = totalPrice + pfRate:                                  │
//! │    GST  = B × 18 / 100                running = GST                     │
//! │    CESS = running × 10 / 100          (not B × 10 / 100)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ordering step makes the result independent of where compound
//! entries appear in the source list.

use crate::money::percent_of;
use crate::types::{LineItem, TaxAmount, TaxBreakupEntry, TaxComponent, TaxRule};

/// Which rule set applies to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    /// Inter-state (IGST-style).
    Inter,
    /// Intra-state (CGST/SGST-style).
    Intra,
}

impl Jurisdiction {
    pub fn from_is_inter(is_inter: bool) -> Self {
        if is_inter {
            Jurisdiction::Inter
        } else {
            Jurisdiction::Intra
        }
    }
}

/// Stable partition: non-compound components keep their order, compound
/// components follow in their original relative order.
pub fn order_compound_last(components: &[TaxComponent]) -> Vec<TaxComponent> {
    let (mut ordered, compound): (Vec<_>, Vec<_>) =
        components.iter().cloned().partition(|c| !c.compound);
    ordered.extend(compound);
    ordered
}

/// Builds the breakup for one rule. Under tax exemption every percentage
/// is zero but the components are still listed.
pub fn build_breakup(rule: Option<&TaxRule>, tax_exempt: bool) -> Vec<TaxBreakupEntry> {
    let Some(rule) = rule else {
        return Vec::new();
    };

    order_compound_last(&rule.tax_req_ls)
        .into_iter()
        .map(|component| TaxBreakupEntry {
            tax_percentage: if tax_exempt { 0.0 } else { component.rate },
            tax_name: component.tax_name,
            compound: component.compound,
        })
        .collect()
}

/// Returns `(inter, intra)` breakups for a line. Missing HSN details yield
/// empty breakups (zero tax).
pub fn resolve_breakups(
    line: &LineItem,
    tax_exempt: bool,
) -> (Vec<TaxBreakupEntry>, Vec<TaxBreakupEntry>) {
    let hsn = line.hsn_details.as_ref();
    (
        build_breakup(hsn.and_then(|h| h.inter_tax.as_ref()), tax_exempt),
        build_breakup(hsn.and_then(|h| h.intra_tax.as_ref()), tax_exempt),
    )
}

/// Headline inter-state rate used for a line's `totalTax` in inter mode.
pub fn inter_total_rate(line: &LineItem, tax_exempt: bool) -> f64 {
    if tax_exempt {
        0.0
    } else {
        line.inter_total_tax()
    }
}

/// Result of walking a breakup over a base amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxWalk {
    /// One amount per breakup entry, same order.
    pub components: Vec<TaxAmount>,
    /// Sum of the non-compound amounts.
    pub non_compound_total: f64,
}

impl TaxWalk {
    /// Sum of every component, compound included.
    pub fn total(&self) -> f64 {
        self.components.iter().map(|c| c.value).sum()
    }
}

/// Walks `breakup` in order over `base`.
///
/// Non-compound: `base × pct / 100`, added to the running total.
/// Compound: `running × pct / 100`.
pub fn walk_taxes(breakup: &[TaxBreakupEntry], base: f64) -> TaxWalk {
    let mut walk = TaxWalk::default();

    for entry in breakup {
        let value = if entry.compound {
            percent_of(walk.non_compound_total, entry.tax_percentage)
        } else {
            let value = percent_of(base, entry.tax_percentage);
            walk.non_compound_total += value;
            value
        };

        walk.components.push(TaxAmount {
            tax_name: entry.tax_name.clone(),
            tax_percentage: entry.tax_percentage,
            compound: entry.compound,
            value,
        });
    }

    walk
}

/// Line-level `totalTax` for a walk.
///
/// Intra-state uses the non-compound running total; inter-state uses the
/// rule's headline `totalTax` rate on the base. The intra shape never
/// includes compound components; those still reach the per-name totals.
pub fn line_total_tax(
    line: &LineItem,
    walk: &TaxWalk,
    jurisdiction: Jurisdiction,
    base: f64,
    tax_exempt: bool,
) -> f64 {
    match jurisdiction {
        Jurisdiction::Intra => walk.non_compound_total,
        Jurisdiction::Inter => percent_of(base, inter_total_rate(line, tax_exempt)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
