//! # tally-session: Calculation Session Layer for Tally
//!
//! Wraps the pure engine in `tally-core` with configuration, logging, an
//! input gate and a degrade-on-error policy. Front-end bridges call
//! [`CartCalculator::calculate`] (or [`CartCalculator::calculate_json`])
//! and always get a [`CartCalculation`] back.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Architecture                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 CartCalculator (orchestrator)                    │  │
//! │  │                                                                  │  │
//! │  │  One tracing span per calculation, tagged with a uuid            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ PricingConfig  │  │   tally-core   │  │  ShippingTaxBreakdown  │    │
//! │  │                │  │                │  │                        │    │
//! │  │ defaults, TOML │  │ normalize,     │  │ shipping tax, display  │    │
//! │  │ env overrides  │  │ aggregate,     │  │ rows (StandardBreakdown│    │
//! │  │                │  │ volume, seller │  │ or a custom impl)      │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`calculator`] - `CartCalculator`, request and response types
//! - [`config`] - Pricing configuration (TOML + environment)
//! - [`breakdown`] - Shipping tax and breakup rows
//! - [`error`] - Session error types and front-end error codes
//! - [`telemetry`] - `tracing-subscriber` setup for hosts
//!
//! ## Example
//! ```rust
//! use tally_session::{CartCalculator, CartRequest, PricingConfig};
//! use tally_core::LineItem;
//!
//! let calculator = CartCalculator::new(PricingConfig::default());
//! let result = calculator.calculate(CartRequest {
//!     lines: vec![LineItem::new("P-1", 250.0, 4.0)],
//!     ..CartRequest::default()
//! });
//!
//! assert!(!result.degraded);
//! assert_eq!(result.cart_value.total_value, 1000.0);
//! ```

pub mod breakdown;
pub mod calculator;
pub mod config;
pub mod error;
pub mod telemetry;

pub use breakdown::{Breakdown, BreakdownRequest, BreakupEntry, ShippingTaxBreakdown, StandardBreakdown};
pub use calculator::{CalculationError, CartCalculation, CartCalculator, CartRequest};
pub use config::PricingConfig;
pub use error::{ErrorCode, SessionError, SessionResult};
pub use telemetry::init_tracing;
