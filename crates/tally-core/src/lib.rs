//! # tally-core: Pure Pricing Engine for Tally
//!
//! This crate is the **heart** of Tally. It prices B2B carts and quotes:
//! per-line discounts, compound multi-tax, cash and volume discount
//! overlays, per-seller carts and rounding to a grand total. Every function
//! is a pure computation over in-memory data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Front end (cart / quote screens)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ camelCase JSON                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             tally-session (config, logging, gate)               │   │
//! │  │    CartCalculator::calculate, ShippingTaxBreakdown              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   tax ──► normalize ──► cart ──► volume ──► seller              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO SHARED STATE                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire types (LineItem, CartValue, tax rules, bundles)
//! - [`money`] - Rounding and percentage helpers
//! - [`tax`] - Tax breakup resolution and compound walks
//! - [`normalize`] - Line item normalizer
//! - [`cart`] - Cart aggregator, cash discount overlay, item numbers
//! - [`volume`] - Volume discount engine
//! - [`seller`] - Seller partitioning and price list matching
//! - [`settings`] - Per-tenant pricing switches
//! - [`validation`] - Input checks used by callers
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output (item numbers come from an
//!    injected [`cart::ItemNoSource`])
//! 2. **No Input Mutation**: every stage returns new lines
//! 3. **Degrade, Don't Panic**: missing data becomes defaults; the volume
//!    engine reports faults as a typed partial result
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::cart::{aggregate_cart, CartContext, SequentialItemNo};
//! use tally_core::normalize::normalize_lines;
//! use tally_core::{LineItem, Settings};
//!
//! let mut line = LineItem::new("P-1", 200.0, 3.0);
//! line.discount = Some(10.0);
//!
//! let normalized = normalize_lines(&[line], false, 2);
//! let ctx = CartContext { precision: 2, ..CartContext::default() };
//! let priced = aggregate_cart(&normalized, &ctx, &Settings::default(), &mut SequentialItemNo::default());
//!
//! assert_eq!(priced.cart_value.total_value, 540.0);
//! assert_eq!(priced.lines[0].item_no.as_deref(), Some("1"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod normalize;
pub mod seller;
pub mod settings;
pub mod tax;
pub mod types;
pub mod validation;
pub mod volume;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, VolumeFault};
pub use settings::Settings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines accepted in a single calculation.
///
/// Large B2B quotes run to a few hundred lines; anything beyond this is a
/// runaway payload.
pub const MAX_CART_LINES: usize = 1000;

/// Maximum rounding precision (decimal places).
pub const MAX_PRECISION: u32 = 6;
