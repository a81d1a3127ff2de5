//! End-to-end calculations through the session layer.

use std::collections::HashMap;

use serde_json::json;
use tally_core::money::approx_eq;
use tally_core::seller::DiscountRow;
use tally_core::volume::VdData;
use tally_core::{LineItem, VolumeDiscountOffer, VolumeTier};
use tally_session::{
    Breakdown, BreakdownRequest, BreakupEntry, CartCalculator, CartRequest, PricingConfig,
    ShippingTaxBreakdown,
};

fn gst_payload(product_id: &str, price: f64, qty: f64, seller: &str) -> serde_json::Value {
    json!({
        "productId": product_id,
        "unitListPrice": price,
        "askedQuantity": qty,
        "sellerId": seller,
        "hsnDetails": {
            "tax": 18,
            "intraTax": {
                "totalTax": 18,
                "taxReqLs": [
                    { "taxName": "CGST", "rate": 9, "compound": false },
                    { "taxName": "SGST", "rate": 9, "compound": false }
                ]
            },
            "interTax": {
                "totalTax": 18,
                "taxReqLs": [{ "taxName": "IGST", "rate": 18, "compound": false }]
            }
        }
    })
}

#[test]
fn json_request_is_priced() {
    let payload = json!({
        "lines": [gst_payload("P-1", 100.0, 3.0, "S1")],
        "precision": 2,
        "settings": { "roundingAdjustment": true }
    });
    let result = CartCalculator::default().calculate_json(&payload.to_string());

    assert!(!result.degraded, "{:?}", result.error);
    assert!(approx_eq(result.cart_value.total_value, 300.0));
    assert!(approx_eq(result.cart_value.tax_total("CGST"), 27.0));
    assert!(approx_eq(result.cart_value.grand_total, 354.0));
    assert!(result.breakup.iter().any(|e| e.key == "SGST"));

    let serialized = serde_json::to_value(&result).unwrap();
    assert_eq!(serialized["degraded"], json!(false));
    assert!(serialized["cartValue"]["totalLP"].is_number());
}

#[test]
fn both_quantity_keys_are_accepted() {
    let mut line = gst_payload("P-1", 100.0, 2.0, "S1");
    line["quantity"] = json!(2);
    line["packagingQty"] = json!(1);
    line["packagingQuantity"] = json!(1);
    let payload = json!({ "lines": [line] });

    let result = CartCalculator::default().calculate_json(&payload.to_string());

    assert!(!result.degraded, "{:?}", result.error);
    assert_eq!(result.lines[0].quantity, 2.0);
    assert!(approx_eq(result.cart_value.total_value, 200.0));
    assert!(approx_eq(result.cart_value.grand_total, 236.0));
}

#[test]
fn credit_line_is_priced_not_degraded() {
    let result = CartCalculator::default().calculate(CartRequest {
        lines: vec![
            LineItem::new("P-1", 100.0, 1.0),
            LineItem::new("CREDIT", -50.0, 1.0),
        ],
        ..CartRequest::default()
    });

    assert!(!result.degraded, "{:?}", result.error);
    assert!(result.cart_value.has_products_with_negative_total_price);
    assert!(approx_eq(result.cart_value.total_value, 50.0));
    assert!(result.lines[1].total_price < 0.0);
}

#[test]
fn item_wise_shipping_is_taxed_per_line() {
    let line: LineItem = serde_json::from_value(gst_payload("P-1", 100.0, 1.0, "S1")).unwrap();
    let mut config = PricingConfig::default();
    config.settings.item_wise_shipping_tax = true;

    let result = CartCalculator::new(config).calculate(CartRequest {
        lines: vec![line],
        overall_shipping: 100.0,
        before_tax: Some(true),
        ..CartRequest::default()
    });

    assert!(!result.degraded, "{:?}", result.error);
    assert!(approx_eq(result.lines[0].shipping_charges, 100.0));
    assert!(approx_eq(result.cart_value.total_tax, 36.0));
    assert!(approx_eq(result.cart_value.calculated_total, 236.0));
    let shipping_tax = result.breakup.iter().find(|e| e.key == "shippingTax");
    assert!(approx_eq(shipping_tax.map_or(0.0, |e| e.amount), 18.0));
}

#[test]
fn item_wise_shipping_reaches_volume_pass() {
    let mut line: LineItem = serde_json::from_value(gst_payload("P-1", 100.0, 2.0, "S1")).unwrap();
    line.item_no = Some("L-1".into());
    let mut config = PricingConfig::default();
    config.settings.item_wise_shipping_tax = true;

    let result = CartCalculator::new(config).calculate(CartRequest {
        lines: vec![line],
        overall_shipping: 50.0,
        before_tax: Some(true),
        vd_offers: Some(vec![VdData {
            item_no: "L-1".into(),
            volume_discount: 10.0,
        }]),
        ..CartRequest::default()
    });

    let vd = result.vd_details.expect("volume details");
    assert!(approx_eq(vd.shipping_tax, 9.0));
    assert!(approx_eq(vd.sub_total_volume, 180.0));
}

#[test]
fn inter_state_uses_igst() {
    let payload = json!({
        "lines": [gst_payload("P-1", 100.0, 1.0, "S1")],
        "isInter": true
    });
    let result = CartCalculator::default().calculate_json(&payload.to_string());
    assert!(approx_eq(result.cart_value.tax_total("IGST"), 18.0));
    assert_eq!(result.cart_value.tax_total("CGST"), 0.0);
}

#[test]
fn multi_seller_cart_gets_seller_carts() {
    let lines: Vec<LineItem> = [
        gst_payload("A", 100.0, 1.0, "S1"),
        gst_payload("B", 200.0, 2.0, "S2"),
    ]
    .into_iter()
    .map(|v| serde_json::from_value(v).unwrap())
    .collect();

    let result = CartCalculator::default().calculate(CartRequest {
        lines,
        ..CartRequest::default()
    });

    let carts = result.seller_carts.expect("seller carts");
    assert_eq!(carts.len(), 2);
    assert_eq!(carts["S2"].total_quantity, 2.0);
    assert_eq!(carts["S1"].items[0].item_no.as_deref(), Some("1"));

    let summary = result.summary.expect("summary");
    assert!(approx_eq(summary.total_value, result.cart_value.total_value));
    assert!(approx_eq(summary.total_tax, result.cart_value.total_tax));
}

#[test]
fn vd_offers_produce_volume_details() {
    let mut line = LineItem::new("P-1", 100.0, 10.0);
    line.item_no = Some("L-1".into());

    let result = CartCalculator::default().calculate(CartRequest {
        lines: vec![line],
        vd_offers: Some(vec![VdData {
            item_no: "L-1".into(),
            volume_discount: 5.0,
        }]),
        ..CartRequest::default()
    });

    let vd = result.vd_details.expect("volume details");
    assert!(approx_eq(vd.sub_total, 1000.0));
    assert!(approx_eq(vd.sub_total_volume, 950.0));
    assert!(approx_eq(vd.volume_discount_applied, 50.0));
    assert!(result.lines[0].volume_discount_applied);
    assert!(approx_eq(result.cart_value.total_value, 1000.0));
}

#[test]
fn attached_volume_offer_is_applied() {
    let mut line = LineItem::new("P-1", 50.0, 25.0);
    line.volume_discount_obj = Some(VolumeDiscountOffer {
        cant_combine_with_other_discounts: false,
        tiers: vec![
            VolumeTier {
                min_quantity: 10.0,
                max_quantity: Some(19.0),
                discount_percentage: 5.0,
            },
            VolumeTier {
                min_quantity: 20.0,
                max_quantity: None,
                discount_percentage: 10.0,
            },
        ],
    });

    let result = CartCalculator::default().calculate(CartRequest {
        lines: vec![line],
        ..CartRequest::default()
    });
    let vd = result.vd_details.expect("volume details");
    assert!(approx_eq(vd.sub_total_volume, 45.0 * 25.0));
}

#[test]
fn unmatched_price_list_line_is_zeroed() {
    let data = HashMap::from([(
        "no-seller-id".to_string(),
        vec![DiscountRow {
            product_variant_id: "KNOWN".into(),
            list_price: 80.0,
            discount: 10.0,
            ..DiscountRow::default()
        }],
    )]);

    let result = CartCalculator::default().calculate(CartRequest {
        lines: vec![
            LineItem::new("KNOWN", 0.0, 1.0),
            LineItem::new("UNKNOWN", 500.0, 1.0),
        ],
        pricing_data: Some(data),
        ..CartRequest::default()
    });

    assert!(approx_eq(result.lines[0].unit_price, 72.0));
    assert!(result.lines[1].price_not_available);
    assert_eq!(result.lines[1].unit_price, 0.0);
    assert!(approx_eq(result.cart_value.total_value, 72.0));
    assert!(!result.cart_value.has_all_products_available_in_price_list);
}

#[test]
fn config_file_drives_shipping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pricing.toml");
    std::fs::write(
        &path,
        "[shipping]\nbefore_tax = true\nbefore_tax_percentage = 18.0\n",
    )
    .unwrap();
    let config = PricingConfig::load(Some(path)).unwrap();

    let result = CartCalculator::new(config).calculate(CartRequest {
        lines: vec![LineItem::new("P-1", 1000.0, 1.0)],
        overall_shipping: 100.0,
        ..CartRequest::default()
    });

    assert!(approx_eq(result.cart_value.taxable_amount, 1100.0));
    assert!(approx_eq(result.cart_value.total_tax, 18.0));
    assert!(approx_eq(result.cart_value.grand_total, 1118.0));
}

struct TotalsOnly;

impl ShippingTaxBreakdown for TotalsOnly {
    fn breakdown(&self, request: BreakdownRequest<'_>) -> Breakdown {
        Breakdown {
            cart_value: request.cart_value.clone(),
            products: request.lines.to_vec(),
            breakup: vec![BreakupEntry {
                key: "grandTotal".into(),
                label: "Total".into(),
                amount: request.cart_value.grand_total,
            }],
        }
    }
}

#[test]
fn custom_breakdown_is_used() {
    let calculator = CartCalculator::with_breakdown(PricingConfig::default(), TotalsOnly);
    let result = calculator.calculate(CartRequest {
        lines: vec![LineItem::new("P-1", 10.0, 2.0)],
        ..CartRequest::default()
    });
    assert_eq!(result.breakup.len(), 1);
    assert_eq!(result.breakup[0].label, "Total");
}

#[test]
fn too_many_lines_degrade() {
    let lines = vec![LineItem::new("P-1", 1.0, 1.0); tally_core::MAX_CART_LINES + 1];
    let result = CartCalculator::default().calculate(CartRequest {
        lines,
        ..CartRequest::default()
    });
    assert!(result.degraded);
    assert_eq!(result.lines.len(), tally_core::MAX_CART_LINES + 1);
    assert_eq!(result.cart_value.grand_total, 0.0);
}
