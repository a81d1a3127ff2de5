//! # Cart Calculator
//!
//! Runs the full pricing pipeline for one request.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        calculate(request)                               │
//! │                                                                         │
//! │  span "calculate_cart" { calculation_id = uuid v4 }                     │
//! │       │                                                                 │
//! │       ├─► gate: validate_precision, validate_cart                       │
//! │       ├─► validate_line_item per line (warn! only)                      │
//! │       ├─► price lists: resolve_seller_pricing (when pricingData given)  │
//! │       ├─► normalize_lines                                               │
//! │       ├─► item-wise before-tax shipping: allocate_item_shipping         │
//! │       ├─► aggregate_cart                                                │
//! │       ├─► volume pass (vdOffers given, or any volumeDiscountObj)        │
//! │       ├─► seller carts (more than one seller key)                       │
//! │       └─► breakdown (shipping, shipping tax, display rows)              │
//! │                                                                         │
//! │  Err at any step ──► error! + degraded result:                          │
//! │      zero CartValue, original lines, degraded = true, error            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::cart::{aggregate_cart, allocate_item_shipping, CartContext, SequentialItemNo};
use tally_core::normalize::normalize_lines;
use tally_core::seller::{
    group_by_seller, overall_cart_summary, price_all_seller_carts, resolve_seller_pricing,
    CartSummary, DiscountRow, SellerCart, SellerPricingParams,
};
use tally_core::validation::{validate_cart, validate_line_item, validate_precision};
use tally_core::volume::{
    apply_volume_discount, calculate_volume_discount, VdData, VdDetails, VolumeOutcome,
    VolumeParams,
};
use tally_core::{CartValue, LineItem, Settings};
use tracing::{debug, error, info, info_span, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::breakdown::{BreakdownRequest, BreakupEntry, ShippingTaxBreakdown, StandardBreakdown};
use crate::config::PricingConfig;
use crate::error::{ErrorCode, SessionError, SessionResult};

// =============================================================================
// Request & Response
// =============================================================================

/// One calculation request. Unset options fall back to [`PricingConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CartRequest {
    pub lines: Vec<LineItem>,
    pub is_inter: Option<bool>,
    pub tax_exempt: Option<bool>,
    pub precision: Option<u32>,
    pub settings: Option<Settings>,
    pub insurance_charges: f64,
    pub overall_shipping: f64,
    pub before_tax: Option<bool>,
    pub before_tax_percentage: Option<f64>,
    /// Volume discounts keyed by `itemNo`.
    pub vd_offers: Option<Vec<VdData>>,
    /// Discount service rows keyed by seller id.
    pub pricing_data: Option<HashMap<String, Vec<DiscountRow>>>,
}

/// Why a calculation degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&SessionError> for CalculationError {
    fn from(err: &SessionError) -> Self {
        CalculationError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result of a calculation.
///
/// When `vdDetails` is present, `lines` carry volume prices and
/// `vdDetails` holds the matching totals; `cartValue` keeps the totals
/// before volume discounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartCalculation {
    pub calculation_id: String,
    /// RFC 3339 timestamp.
    pub calculated_at: String,
    pub lines: Vec<LineItem>,
    pub cart_value: CartValue,
    pub vd_details: Option<VdDetails>,
    pub seller_carts: Option<BTreeMap<String, SellerCart>>,
    pub summary: Option<CartSummary>,
    pub breakup: Vec<BreakupEntry>,
    pub degraded: bool,
    pub error: Option<CalculationError>,
}

impl CartCalculation {
    fn degraded(calculation_id: Uuid, lines: Vec<LineItem>, err: &SessionError) -> Self {
        CartCalculation {
            calculation_id: calculation_id.to_string(),
            calculated_at: Utc::now().to_rfc3339(),
            lines,
            degraded: true,
            error: Some(CalculationError::from(err)),
            ..CartCalculation::default()
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Per-request options after applying config defaults.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    is_inter: bool,
    tax_exempt: bool,
    precision: u32,
    settings: Settings,
    before_tax: bool,
    before_tax_percentage: f64,
}

/// Prices carts with a fixed configuration.
#[derive(Debug, Clone)]
pub struct CartCalculator<B = StandardBreakdown> {
    config: PricingConfig,
    breakdown: B,
}

impl CartCalculator<StandardBreakdown> {
    pub fn new(config: PricingConfig) -> Self {
        CartCalculator {
            config,
            breakdown: StandardBreakdown,
        }
    }
}

impl Default for CartCalculator<StandardBreakdown> {
    fn default() -> Self {
        CartCalculator::new(PricingConfig::default())
    }
}

impl<B: ShippingTaxBreakdown> CartCalculator<B> {
    /// Uses a custom breakdown for the last stage.
    pub fn with_breakdown(config: PricingConfig, breakdown: B) -> Self {
        CartCalculator { config, breakdown }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Prices `request`. Never fails: errors yield a degraded result.
    pub fn calculate(&self, request: CartRequest) -> CartCalculation {
        let calculation_id = Uuid::new_v4();
        let span = info_span!(
            "calculate_cart",
            %calculation_id,
            lines = request.lines.len()
        );
        let _enter = span.enter();

        match self.try_calculate(&request, calculation_id) {
            Ok(calculation) => {
                info!(
                    grand_total = calculation.cart_value.grand_total,
                    sellers = calculation.summary.as_ref().map_or(1, |s| s.seller_count),
                    volume = calculation.vd_details.is_some(),
                    "Cart calculated"
                );
                calculation
            }
            Err(err) => {
                error!(error = %err, code = ?err.code(), "Cart calculation failed, returning degraded result");
                CartCalculation::degraded(calculation_id, request.lines, &err)
            }
        }
    }

    /// Prices a camelCase JSON request.
    pub fn calculate_json(&self, json: &str) -> CartCalculation {
        match serde_json::from_str::<CartRequest>(json) {
            Ok(request) => self.calculate(request),
            Err(e) => {
                let calculation_id = Uuid::new_v4();
                let err = SessionError::from(e);
                error!(%calculation_id, error = %err, "Rejected cart request payload");
                CartCalculation::degraded(calculation_id, Vec::new(), &err)
            }
        }
    }

    fn resolve(&self, request: &CartRequest) -> Resolved {
        let config = &self.config;
        Resolved {
            is_inter: request.is_inter.unwrap_or(config.pricing.inter_state),
            tax_exempt: request.tax_exempt.unwrap_or(config.pricing.tax_exempt),
            precision: request.precision.unwrap_or(config.pricing.precision),
            settings: request.settings.unwrap_or(config.settings),
            before_tax: request.before_tax.unwrap_or(config.shipping.before_tax),
            before_tax_percentage: request
                .before_tax_percentage
                .unwrap_or(config.shipping.before_tax_percentage),
        }
    }

    fn try_calculate(
        &self,
        request: &CartRequest,
        calculation_id: Uuid,
    ) -> SessionResult<CartCalculation> {
        let opts = self.resolve(request);

        validate_precision(opts.precision)?;
        validate_cart(&request.lines)?;
        for line in &request.lines {
            if let Err(err) = validate_line_item(line) {
                warn!(item = line.label(), error = %err, "Pricing line that breaks a catalog rule");
            }
        }

        let lines = match &request.pricing_data {
            Some(data) => resolve_seller_pricing(&request.lines, data),
            None => request.lines.clone(),
        };

        let mut normalized = normalize_lines(&lines, opts.tax_exempt, opts.precision);
        if opts.before_tax && opts.settings.item_wise_shipping_tax {
            allocate_item_shipping(&mut normalized, request.overall_shipping);
        }
        let ctx = CartContext {
            is_inter: opts.is_inter,
            insurance_charges: request.insurance_charges,
            precision: opts.precision,
            tax_exempt: opts.tax_exempt,
        };
        let mut item_nos = SequentialItemNo::default();
        let priced = aggregate_cart(&normalized, &ctx, &opts.settings, &mut item_nos);

        let volume = self.volume_pass(request, &opts, &priced.lines, &priced.cart_value);

        let buckets = group_by_seller(&priced.lines);
        let (seller_carts, summary) = if buckets.len() > 1 {
            let params = SellerPricingParams {
                tax_exempt: opts.tax_exempt,
                precision: opts.precision,
                is_inter: opts.is_inter,
                insurance_charges: 0.0,
                settings: opts.settings,
            };
            let carts = price_all_seller_carts(&buckets, &params, &mut item_nos);
            let summary = overall_cart_summary(&carts);
            debug!(sellers = summary.seller_count, "Priced seller carts");
            (Some(carts), Some(summary))
        } else {
            (None, None)
        };

        let (lines, vd_details) = match volume {
            Some(outcome) => (outcome.lines, Some(outcome.vd_details)),
            None => (priced.lines, None),
        };

        let breakdown = self.breakdown.breakdown(BreakdownRequest {
            overall_shipping: request.overall_shipping,
            cart_value: &priced.cart_value,
            lines: &lines,
            before_tax: opts.before_tax,
            before_tax_percentage: opts.before_tax_percentage,
            is_inter: opts.is_inter,
            precision: opts.precision,
            settings: opts.settings,
        });

        Ok(CartCalculation {
            calculation_id: calculation_id.to_string(),
            calculated_at: Utc::now().to_rfc3339(),
            lines: breakdown.products,
            cart_value: breakdown.cart_value,
            vd_details,
            seller_carts,
            summary,
            breakup: breakdown.breakup,
            degraded: false,
            error: None,
        })
    }

    fn volume_pass(
        &self,
        request: &CartRequest,
        opts: &Resolved,
        lines: &[LineItem],
        cart_value: &CartValue,
    ) -> Option<VolumeOutcome> {
        let has_attached = lines.iter().any(|line| line.volume_discount_obj.is_some());
        if request.vd_offers.is_none() && !has_attached {
            return None;
        }

        let params = VolumeParams {
            sub_total: cart_value.total_value,
            overall_shipping: request.overall_shipping,
            before_tax: opts.before_tax,
            before_tax_percentage: opts.before_tax_percentage,
            precision: opts.precision,
            is_inter: opts.is_inter,
            insurance_charges: request.insurance_charges,
            tax_exempt: opts.tax_exempt,
        };

        let outcome = match &request.vd_offers {
            Some(offers) => apply_volume_discount(lines, offers, &params, &opts.settings),
            None => calculate_volume_discount(lines, &params, &opts.settings).unwrap_or_else(
                |partial| {
                    warn!(
                        processed = partial.processed,
                        total = partial.total,
                        error = %partial,
                        "Using partial volume discount result"
                    );
                    partial.into_outcome()
                },
            ),
        };
        Some(outcome)
    }
}
