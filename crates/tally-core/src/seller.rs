//! # Seller Cart Partitioner
//!
//! Splits a multi-seller cart into per-seller carts, prices each one
//! independently and rolls the results up.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► group_by_seller ──► { "S1": bucket, "S2": bucket, ... }      │
//! │                                        │                                │
//! │                                        ▼  per bucket                    │
//! │                         normalize_lines ──► aggregate_cart              │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                         { "S1": SellerCart, "S2": SellerCart }          │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                              overall_cart_summary                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Seller key: `sellerId`, else `vendorId`, else `"no-seller"`. Buckets are
//! rebuilt on every pass and keyed in sorted order.
//!
//! Price list resolution ([`find_best_pricing_match`]) lives here too: rows
//! from the discount service are keyed by seller id, with a catch-all
//! `"no-seller-id"` bucket.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::cart::{aggregate_cart, CartContext, ItemNoSource};
use crate::normalize::normalize_lines;
use crate::settings::Settings;
use crate::types::{CartValue, LineItem};

/// Catch-all key in discount service results.
pub const NO_SELLER_ID_KEY: &str = "no-seller-id";

// =============================================================================
// Grouping
// =============================================================================

/// Display metadata of a seller, taken from the first line in its bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerInfo {
    /// Bucket key.
    pub id: String,
    pub seller_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
}

/// Lines of one seller, before pricing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerBucket {
    pub seller: SellerInfo,
    pub items: Vec<LineItem>,
    pub item_count: usize,
    pub total_quantity: f64,
}

/// Partitions lines by seller key. Pure grouping, no pricing.
pub fn group_by_seller(lines: &[LineItem]) -> BTreeMap<String, SellerBucket> {
    let mut buckets: BTreeMap<String, SellerBucket> = BTreeMap::new();

    for line in lines {
        let key = line.seller_key();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| SellerBucket {
                seller: SellerInfo {
                    id: key.to_string(),
                    seller_id: line.seller_id.clone().or_else(|| line.vendor_id.clone()),
                    name: line.seller_name.clone().or_else(|| line.vendor_name.clone()),
                    location: line.seller_location.clone(),
                },
                ..SellerBucket::default()
            });

        bucket.items.push(line.clone());
        bucket.item_count += 1;
        bucket.total_quantity += line.quantity;
    }

    debug!(lines = lines.len(), sellers = buckets.len(), "Grouped cart by seller");
    buckets
}

// =============================================================================
// Pricing
// =============================================================================

/// Parameters shared by every seller cart in a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SellerPricingParams {
    pub tax_exempt: bool,
    pub precision: u32,
    pub is_inter: bool,
    pub insurance_charges: f64,
    pub settings: Settings,
}

/// Result of pricing one seller's lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SellerPricing {
    pub pricing: CartValue,
    pub processed_items: Vec<LineItem>,
}

/// A priced seller cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerCart {
    pub seller: SellerInfo,
    pub items: Vec<LineItem>,
    pub item_count: usize,
    pub total_quantity: f64,
    pub pricing: CartValue,
}

impl SellerCart {
    /// Combines a bucket's metadata with its pricing result.
    pub fn from_priced(bucket: &SellerBucket, priced: SellerPricing) -> Self {
        SellerCart {
            seller: bucket.seller.clone(),
            items: priced.processed_items,
            item_count: bucket.item_count,
            total_quantity: bucket.total_quantity,
            pricing: priced.pricing,
        }
    }
}

/// Normalizes then aggregates one seller's lines. No lines yields a zeroed
/// [`CartValue`].
pub fn price_seller_cart(
    items: &[LineItem],
    params: &SellerPricingParams,
    item_nos: &mut dyn ItemNoSource,
) -> SellerPricing {
    if items.is_empty() {
        return SellerPricing::default();
    }

    let normalized = normalize_lines(items, params.tax_exempt, params.precision);
    let ctx = CartContext {
        is_inter: params.is_inter,
        insurance_charges: params.insurance_charges,
        precision: params.precision,
        tax_exempt: params.tax_exempt,
    };
    let priced = aggregate_cart(&normalized, &ctx, &params.settings, item_nos);

    SellerPricing {
        pricing: priced.cart_value,
        processed_items: priced.lines,
    }
}

/// Prices every bucket independently.
pub fn price_all_seller_carts(
    buckets: &BTreeMap<String, SellerBucket>,
    params: &SellerPricingParams,
    item_nos: &mut dyn ItemNoSource,
) -> BTreeMap<String, SellerCart> {
    buckets
        .iter()
        .map(|(key, bucket)| {
            let priced = price_seller_cart(&bucket.items, params, item_nos);
            (key.clone(), SellerCart::from_priced(bucket, priced))
        })
        .collect()
}

/// Roll-up over all seller carts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CartSummary {
    pub seller_count: usize,
    pub total_items: usize,
    pub total_value: f64,
    pub total_tax: f64,
    pub grand_total: f64,
}

/// Flat sum of each seller's pricing. No cross-seller tax interaction.
pub fn overall_cart_summary(carts: &BTreeMap<String, SellerCart>) -> CartSummary {
    carts.values().fold(
        CartSummary {
            seller_count: carts.len(),
            ..CartSummary::default()
        },
        |mut summary, cart| {
            summary.total_items += cart.pricing.total_items;
            summary.total_value += cart.pricing.total_value;
            summary.total_tax += cart.pricing.total_tax;
            summary.grand_total += cart.pricing.grand_total;
            summary
        },
    )
}

// =============================================================================
// Price List Resolution
// =============================================================================

/// One row from the discount service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "PascalCase", default)]
pub struct DiscountRow {
    pub product_variant_id: String,
    pub list_price: f64,
    pub master_price: Option<f64>,
    pub discount: f64,
    pub seller_id: Option<String>,
    pub price_list_code: Option<String>,
}

/// Finds the price list row for a line.
///
/// Tries the `sellerId` bucket, then `vendorId`, then `"no-seller-id"`,
/// matching `ProductVariantId` against `productId`. A seller-specific row
/// always wins over the catch-all.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use tally_core::seller::{find_best_pricing_match, DiscountRow};
/// use tally_core::LineItem;
///
/// let row = DiscountRow {
///     product_variant_id: "P-1".into(),
///     list_price: 120.0,
///     ..DiscountRow::default()
/// };
/// let data = HashMap::from([("no-seller-id".to_string(), vec![row])]);
///
/// let line = LineItem::new("P-1", 0.0, 1.0);
/// assert_eq!(find_best_pricing_match(&line, &data).map(|r| r.list_price), Some(120.0));
/// ```
pub fn find_best_pricing_match<'a>(
    line: &LineItem,
    pricing_data: &'a HashMap<String, Vec<DiscountRow>>,
) -> Option<&'a DiscountRow> {
    [
        line.seller_id.as_deref(),
        line.vendor_id.as_deref(),
        Some(NO_SELLER_ID_KEY),
    ]
    .into_iter()
    .flatten()
    .filter_map(|key| pricing_data.get(key))
    .find_map(|rows| rows.iter().find(|row| row.product_variant_id == line.product_id))
}

/// Applies a resolved row to a copy of the line. No row marks the line
/// `priceNotAvailable`.
pub fn apply_pricing_match(line: &LineItem, row: Option<&DiscountRow>) -> LineItem {
    let mut line = line.clone();
    match row {
        Some(row) => {
            line.unit_list_price = row.list_price;
            line.discount = Some(row.discount);
            line.discount_percentage = Some(row.discount);
            line.price_not_available = false;
            line.is_product_available_in_price_list = true;
        }
        None => {
            line.price_not_available = true;
            line.is_product_available_in_price_list = false;
        }
    }
    line
}

/// Resolves and applies price list rows for every line.
pub fn resolve_seller_pricing(
    lines: &[LineItem],
    pricing_data: &HashMap<String, Vec<DiscountRow>>,
) -> Vec<LineItem> {
    let resolved: Vec<LineItem> = lines
        .iter()
        .map(|line| apply_pricing_match(line, find_best_pricing_match(line, pricing_data)))
        .collect();

    let unmatched = resolved.iter().filter(|line| line.price_not_available).count();
    debug!(lines = resolved.len(), unmatched, "Resolved seller price lists");
    resolved
}

// =============================================================================
// Unit Tests
// =============================================================================
