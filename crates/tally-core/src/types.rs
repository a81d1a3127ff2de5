//! # Domain Types
//!
//! Wire shapes shared with the front end. Every struct serializes as
//! camelCase JSON and exports a TypeScript binding.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │   HsnDetails    │   │    CartValue    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  productId      │──►│  tax            │   │  totalValue     │       │
//! │  │  unitListPrice  │   │  interTax ──┐   │   │  totalTax       │       │
//! │  │  discount       │   │  intraTax ──┤   │   │  taxTotals[]    │       │
//! │  │  quantity       │   └─────────────┼───┘   │  grandTotal     │       │
//! │  │  bundleProducts │                 ▼       └─────────────────┘       │
//! │  └─────────────────┘   ┌─────────────────┐                             │
//! │                        │    TaxRule      │   ┌─────────────────┐       │
//! │                        │  totalTax       │   │ TaxBreakupEntry │       │
//! │                        │  taxReqLs[] ────┼──►│ TaxAmount       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Missing Fields
//! Every struct deserializes with container-level defaults: absent numbers
//! are `0`, absent flags are `false` (except `showPrice`, which defaults to
//! `true`), absent lists are empty.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bucket key for lines with neither `sellerId` nor `vendorId`.
pub const NO_SELLER_KEY: &str = "no-seller";

// =============================================================================
// Tax Definitions
// =============================================================================

/// One named rate inside an HSN tax rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxComponent {
    pub tax_name: String,
    /// Rate as a percentage (9.0 = 9%).
    pub rate: f64,
    /// Levied on the prior non-compound taxes rather than on the base.
    pub compound: bool,
}

/// A jurisdiction's tax rule set (inter-state or intra-state).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxRule {
    pub total_tax: f64,
    pub tax_req_ls: Vec<TaxComponent>,
}

/// HSN classification attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct HsnDetails {
    pub hsn_code: Option<String>,
    /// Headline tax percentage used for `prodTax` and inclusive back-out.
    pub tax: f64,
    pub inter_tax: Option<TaxRule>,
    pub intra_tax: Option<TaxRule>,
}

/// One resolved entry of a line's tax breakup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxBreakupEntry {
    pub tax_name: String,
    pub tax_percentage: f64,
    pub compound: bool,
}

/// A computed tax amount on a line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxAmount {
    pub tax_name: String,
    pub tax_percentage: f64,
    pub compound: bool,
    pub value: f64,
}

/// Cart-level total for one tax name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxTotal {
    pub tax_name: String,
    pub amount: f64,
}

/// Adds `amount` to the total named `tax_name`, keeping first-seen order.
pub fn add_tax_total(totals: &mut Vec<TaxTotal>, tax_name: &str, amount: f64) {
    match totals.iter_mut().find(|t| t.tax_name == tax_name) {
        Some(total) => total.amount += amount,
        None => totals.push(TaxTotal {
            tax_name: tax_name.to_string(),
            amount,
        }),
    }
}

// =============================================================================
// Bundles
// =============================================================================

/// A component of a bundled parent line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleProduct {
    pub product_id: String,
    pub unit_list_price: f64,
    /// Front-end toggle; wins over `bundleSelected` when present.
    #[serde(rename = "isBundleSelected_fe")]
    pub is_bundle_selected_fe: Option<bool>,
    pub bundle_selected: Option<bool>,
}

impl BundleProduct {
    /// A component with no selection flag at all counts as selected.
    pub fn is_selected(&self) -> bool {
        self.is_bundle_selected_fe
            .or(self.bundle_selected)
            .unwrap_or(true)
    }
}

// =============================================================================
// Volume Discount Offers
// =============================================================================

/// One quantity band of a volume discount offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeTier {
    pub min_quantity: f64,
    pub max_quantity: Option<f64>,
    pub discount_percentage: f64,
}

/// Tiered volume discount attached to a line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeDiscountOffer {
    #[serde(
        rename = "CantCombineWithOtherDisCounts",
        alias = "cantCombineWithOtherDiscounts"
    )]
    pub cant_combine_with_other_discounts: bool,
    pub tiers: Vec<VolumeTier>,
}

impl VolumeDiscountOffer {
    /// Percentage unlocked at `quantity`: the matching tier with the highest
    /// minimum, or 0 when no tier matches.
    pub fn discount_for(&self, quantity: f64) -> f64 {
        self.tiers
            .iter()
            .filter(|tier| {
                quantity >= tier.min_quantity
                    && tier.max_quantity.map_or(true, |max| quantity <= max)
            })
            .max_by(|a, b| a.min_quantity.total_cmp(&b.min_quantity))
            .map_or(0.0, |tier| tier.discount_percentage)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product line in a cart or quote.
///
/// Input fields and computed fields share the struct so a priced line can be
/// fed back into the pipeline (the front end keeps it in state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    // --- identity ---
    pub product_id: String,
    pub item_no: Option<String>,
    pub product_name: Option<String>,

    // --- pricing inputs ---
    pub unit_list_price: f64,
    pub discount: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub quantity: f64,
    /// Synonym of `quantity`; front-end lines often carry both keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asked_quantity: Option<f64>,
    pub packaging_qty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_quantity: Option<f64>,
    pub min_order_quantity: Option<f64>,
    #[serde(rename = "checkMOQ")]
    pub check_moq: bool,

    // --- first-run snapshots ---
    #[serde(rename = "initial_unitListPrice_fe")]
    pub initial_unit_list_price: Option<f64>,
    #[serde(rename = "initial_discounted_price_fe")]
    pub initial_discounted_price: Option<f64>,

    // --- computed pricing ---
    pub discounted_price: f64,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(rename = "unitLP")]
    pub unit_lp: f64,
    #[serde(rename = "unitLPRp")]
    pub unit_lp_rp: f64,
    #[serde(rename = "totalLP")]
    pub total_lp: f64,
    pub buyer_requested_price: f64,

    // --- tax ---
    pub tax_inclusive: bool,
    pub hsn_details: Option<HsnDetails>,
    pub tax: f64,
    pub prod_tax: f64,
    pub total_tax: f64,
    pub item_taxable_amount: f64,
    pub inter_tax_breakup: Vec<TaxBreakupEntry>,
    pub intra_tax_breakup: Vec<TaxBreakupEntry>,
    pub tax_components: Vec<TaxAmount>,

    // --- packing & forwarding ---
    pub pf_item_value: f64,
    pub pf_rate: f64,

    // --- margin ---
    pub product_cost: f64,
    pub addon_cost: f64,
    pub dmc: f64,
    pub margin_percentage: f64,

    // --- cash discount overlay ---
    #[serde(rename = "cashdiscountValue")]
    pub cash_discount_value: f64,
    pub original_unit_price: Option<f64>,
    pub cash_discounted_price: f64,
    pub basic_discounted_price: f64,

    // --- availability ---
    pub show_price: bool,
    pub price_not_available: bool,
    pub list_price_public: Option<bool>,
    pub is_product_available_in_price_list: bool,

    // --- bundles ---
    pub bundle_products: Vec<BundleProduct>,

    // --- volume discount ---
    pub volume_discount_applied: bool,
    pub volume_discount: f64,
    pub unit_volume_price: f64,
    pub total_volume_discount_price: f64,
    pub applied_discount: f64,
    pub tax_volume_discount_percentage: f64,
    pub volume_discount_obj: Option<VolumeDiscountOffer>,
    pub disc_changed: bool,

    // --- seller attribution ---
    pub seller_id: Option<String>,
    pub vendor_id: Option<String>,
    pub seller_name: Option<String>,
    pub vendor_name: Option<String>,
    pub seller_location: Option<String>,

    // --- shipping ---
    pub shipping_charges: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem {
            product_id: String::new(),
            item_no: None,
            product_name: None,
            unit_list_price: 0.0,
            discount: None,
            discount_percentage: None,
            quantity: 0.0,
            asked_quantity: None,
            packaging_qty: None,
            packaging_quantity: None,
            min_order_quantity: None,
            check_moq: false,
            initial_unit_list_price: None,
            initial_discounted_price: None,
            discounted_price: 0.0,
            unit_price: 0.0,
            total_price: 0.0,
            unit_lp: 0.0,
            unit_lp_rp: 0.0,
            total_lp: 0.0,
            buyer_requested_price: 0.0,
            tax_inclusive: false,
            hsn_details: None,
            tax: 0.0,
            prod_tax: 0.0,
            total_tax: 0.0,
            item_taxable_amount: 0.0,
            inter_tax_breakup: Vec::new(),
            intra_tax_breakup: Vec::new(),
            tax_components: Vec::new(),
            pf_item_value: 0.0,
            pf_rate: 0.0,
            product_cost: 0.0,
            addon_cost: 0.0,
            dmc: 0.0,
            margin_percentage: 0.0,
            cash_discount_value: 0.0,
            original_unit_price: None,
            cash_discounted_price: 0.0,
            basic_discounted_price: 0.0,
            show_price: true,
            price_not_available: false,
            list_price_public: None,
            is_product_available_in_price_list: false,
            bundle_products: Vec::new(),
            volume_discount_applied: false,
            volume_discount: 0.0,
            unit_volume_price: 0.0,
            total_volume_discount_price: 0.0,
            applied_discount: 0.0,
            tax_volume_discount_percentage: 0.0,
            volume_discount_obj: None,
            disc_changed: false,
            seller_id: None,
            vendor_id: None,
            seller_name: None,
            vendor_name: None,
            seller_location: None,
            shipping_charges: 0.0,
        }
    }
}

impl LineItem {
    /// Creates a line with the three inputs every caller supplies.
    pub fn new(product_id: impl Into<String>, unit_list_price: f64, quantity: f64) -> Self {
        LineItem {
            product_id: product_id.into(),
            unit_list_price,
            quantity,
            ..LineItem::default()
        }
    }

    /// Folds the synonym keys into `quantity` and `packagingQty`.
    ///
    /// `quantity` wins when set (non-zero), then `askedQuantity`. The
    /// synonym is echoed back with the resolved value.
    pub fn resolve_quantity_aliases(&mut self) {
        if let Some(asked) = self.asked_quantity {
            if self.quantity == 0.0 {
                self.quantity = asked;
            }
            self.asked_quantity = Some(self.quantity);
        }
        self.packaging_qty = self.packaging_qty.or(self.packaging_quantity);
    }

    /// Effective base discount: `discount` first, then `discountPercentage`.
    pub fn discount_pct(&self) -> f64 {
        self.discount.or(self.discount_percentage).unwrap_or(0.0)
    }

    /// Hidden or missing price: the line prices at zero.
    #[inline]
    pub fn is_price_unavailable(&self) -> bool {
        !self.show_price || self.price_not_available
    }

    /// `hsnDetails.tax`, zero when absent.
    pub fn hsn_tax(&self) -> f64 {
        self.hsn_details.as_ref().map_or(0.0, |hsn| hsn.tax)
    }

    /// `hsnDetails.interTax.totalTax`, zero when absent.
    pub fn inter_total_tax(&self) -> f64 {
        self.hsn_details
            .as_ref()
            .and_then(|hsn| hsn.inter_tax.as_ref())
            .map_or(0.0, |rule| rule.total_tax)
    }

    /// Amount tax is levied on: line total plus packing/forwarding.
    #[inline]
    pub fn tax_base(&self) -> f64 {
        self.total_price + self.pf_rate
    }

    /// Seller bucket key: `sellerId`, then `vendorId`, then [`NO_SELLER_KEY`].
    pub fn seller_key(&self) -> &str {
        self.seller_id
            .as_deref()
            .or(self.vendor_id.as_deref())
            .unwrap_or(NO_SELLER_KEY)
    }

    /// Identifier used in logs and faults.
    pub fn label(&self) -> &str {
        self.item_no.as_deref().unwrap_or(&self.product_id)
    }
}

// =============================================================================
// Cart Value
// =============================================================================

/// Aggregate totals for a list of lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CartValue {
    pub total_items: usize,
    pub total_value: f64,
    pub total_tax: f64,
    #[serde(rename = "totalLP")]
    pub total_lp: f64,
    pub pf_rate: f64,
    pub total_shipping: f64,
    pub total_cash_discount: f64,
    pub total_basic_discount: f64,
    /// Percentage of the last cash-discounted line, not a sum.
    pub cash_discount_value: f64,
    /// Per-tax-name totals in first-seen order.
    pub tax_totals: Vec<TaxTotal>,
    pub insurance_charges: f64,
    pub taxable_amount: f64,
    pub calculated_total: f64,
    pub grand_total: f64,
    pub rounding_adjustment: f64,
    pub hide_list_price_public: bool,
    pub has_products_with_negative_total_price: bool,
    pub has_all_products_available_in_price_list: bool,
}

impl CartValue {
    /// Total collected under `tax_name`, zero when the name never appeared.
    pub fn tax_total(&self, tax_name: &str) -> f64 {
        self.tax_totals
            .iter()
            .find(|t| t.tax_name == tax_name)
            .map_or(0.0, |t| t.amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_item_deserializes_front_end_payload() {
        let line: LineItem = serde_json::from_value(json!({
            "productId": "P-100",
            "unitListPrice": 250.0,
            "discount": 10,
            "askedQuantity": 4,
            "packagingQuantity": 2,
            "cashdiscountValue": 2,
            "isProductAvailableInPriceList": true,
            "hsnDetails": {
                "tax": 18,
                "intraTax": {
                    "totalTax": 18,
                    "taxReqLs": [
                        { "taxName": "CGST", "rate": 9, "compound": false },
                        { "taxName": "SGST", "rate": 9, "compound": false }
                    ]
                }
            },
            "bundleProducts": [
                { "productId": "B-1", "unitListPrice": 20, "isBundleSelected_fe": false }
            ]
        }))
        .unwrap();

        assert_eq!(line.product_id, "P-100");
        assert_eq!(line.quantity, 0.0);
        assert_eq!(line.asked_quantity, Some(4.0));
        assert_eq!(line.packaging_quantity, Some(2.0));
        assert_eq!(line.discount_pct(), 10.0);
        assert_eq!(line.cash_discount_value, 2.0);
        assert!(line.show_price);
        assert_eq!(line.hsn_tax(), 18.0);
        assert!(!line.bundle_products[0].is_selected());
    }

    #[test]
    fn test_quantity_synonyms_resolve() {
        let mut both: LineItem = serde_json::from_value(json!({
            "productId": "P-1",
            "quantity": 3,
            "askedQuantity": 5,
            "packagingQty": 6,
            "packagingQuantity": 12
        }))
        .unwrap();
        both.resolve_quantity_aliases();
        assert_eq!(both.quantity, 3.0);
        assert_eq!(both.asked_quantity, Some(3.0));
        assert_eq!(both.packaging_qty, Some(6.0));

        let mut asked_only: LineItem =
            serde_json::from_value(json!({ "productId": "P-2", "askedQuantity": 5 })).unwrap();
        asked_only.resolve_quantity_aliases();
        assert_eq!(asked_only.quantity, 5.0);

        let mut plain = LineItem::new("P-3", 1.0, 2.0);
        plain.resolve_quantity_aliases();
        assert_eq!(plain.asked_quantity, None);
        assert!(serde_json::to_value(&plain).unwrap().get("askedQuantity").is_none());
    }

    #[test]
    fn test_line_item_serializes_legacy_names() {
        let line = LineItem::new("P-1", 10.0, 1.0);
        let value = serde_json::to_value(&line).unwrap();
        assert!(value.get("unitLP").is_some());
        assert!(value.get("cashdiscountValue").is_some());
        assert!(value.get("initial_unitListPrice_fe").is_some());
        assert!(value.get("checkMOQ").is_some());
    }

    #[test]
    fn test_discount_aliases() {
        let mut line = LineItem::new("P-1", 10.0, 1.0);
        assert_eq!(line.discount_pct(), 0.0);
        line.discount_percentage = Some(5.0);
        assert_eq!(line.discount_pct(), 5.0);
        line.discount = Some(7.5);
        assert_eq!(line.discount_pct(), 7.5);
    }

    #[test]
    fn test_seller_key_fallbacks() {
        let mut line = LineItem::new("P-1", 10.0, 1.0);
        assert_eq!(line.seller_key(), NO_SELLER_KEY);
        line.vendor_id = Some("V-9".to_string());
        assert_eq!(line.seller_key(), "V-9");
        line.seller_id = Some("S-1".to_string());
        assert_eq!(line.seller_key(), "S-1");
    }

    #[test]
    fn test_volume_tier_selection() {
        let offer = VolumeDiscountOffer {
            cant_combine_with_other_discounts: false,
            tiers: vec![
                VolumeTier {
                    min_quantity: 10.0,
                    max_quantity: Some(49.0),
                    discount_percentage: 5.0,
                },
                VolumeTier {
                    min_quantity: 50.0,
                    max_quantity: None,
                    discount_percentage: 8.0,
                },
            ],
        };
        assert_eq!(offer.discount_for(5.0), 0.0);
        assert_eq!(offer.discount_for(10.0), 5.0);
        assert_eq!(offer.discount_for(75.0), 8.0);
    }

    #[test]
    fn test_add_tax_total_keeps_order() {
        let mut totals = Vec::new();
        add_tax_total(&mut totals, "CGST", 9.0);
        add_tax_total(&mut totals, "SGST", 9.0);
        add_tax_total(&mut totals, "CGST", 1.0);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].tax_name, "CGST");
        assert_eq!(totals[0].amount, 10.0);
    }

    #[test]
    fn test_bundle_selection_defaults() {
        let mut component = BundleProduct::default();
        assert!(component.is_selected());
        component.bundle_selected = Some(false);
        assert!(!component.is_selected());
        component.is_bundle_selected_fe = Some(true);
        assert!(component.is_selected());
    }
}
