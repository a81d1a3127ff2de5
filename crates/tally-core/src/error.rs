//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Line item / cart input failures                │
//! │  └── VolumeFault      - Non-finite value hit by the volume engine      │
//! │                                                                         │
//! │  tally-session errors (separate crate)                                 │
//! │  └── SessionError     - Config, payload and gate failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → degraded output    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Never Errors
//! Normalization, aggregation and seller partitioning absorb missing or odd
//! input into defaults. Only the validation gate and the volume discount
//! engine produce typed errors, and neither panics.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The volume discount engine stopped before pricing every line.
    #[error("Volume discount fault: {0}")]
    VolumeFault(#[from] VolumeFault),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by [`crate::validation`] before a calculation runs, so the caller
/// can decide to degrade instead of pricing garbage.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: String, value: f64 },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Collection is larger than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Volume Fault
// =============================================================================

/// A fault raised while re-pricing a line against volume discount offers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VolumeFault {
    /// An intermediate amount became NaN or infinite.
    ///
    /// ## When This Occurs
    /// - Tax-inclusive line whose tax rate is -100% (division by zero)
    /// - NaN list price or quantity smuggled past the gate
    #[error("{field} for item {item} is not finite ({value})")]
    NonFinite {
        item: String,
        field: &'static str,
        value: f64,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
