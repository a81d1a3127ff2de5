//! # Session Error Types
//!
//! Error types for the calculation session layer.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Payload     │  │       Pricing           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  InvalidPayload │  │  Core (validation gate, │ │
//! │  │  ConfigLoad     │  │                 │  │  volume faults)         │ │
//! │  │  ConfigSave, Io │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed calculation never reaches the caller as an `Err`: the
//! calculator logs it and returns a degraded result carrying
//! [`ErrorCode`] and the message.

use serde::{Deserialize, Serialize};
use tally_core::{CoreError, ValidationError};
use thiserror::Error;
use ts_rs::TS;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session error type.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid pricing configuration.
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// File system error while reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Request Errors
    // =========================================================================
    /// Request JSON did not match the expected shape.
    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    // =========================================================================
    // Pricing Errors
    // =========================================================================
    /// Error from the pricing engine.
    #[error("Pricing error: {0}")]
    Core(#[from] CoreError),
}

impl SessionError {
    /// Machine-readable code for the front end.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::InvalidConfig(_)
            | SessionError::ConfigLoadFailed(_)
            | SessionError::ConfigSaveFailed(_)
            | SessionError::Io(_) => ErrorCode::ConfigError,
            SessionError::InvalidPayload(_) => ErrorCode::InvalidPayload,
            SessionError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            SessionError::Core(CoreError::VolumeFault(_)) => ErrorCode::PricingFault,
        }
    }
}

/// Error codes carried by degraded calculations.
///
/// ## Usage in Front End
/// ```typescript
/// const result = await calculate(request);
/// if (result.degraded) {
///   switch (result.error?.code) {
///     case 'VALIDATION_ERROR':
///       highlightLines(result.error.message);
///       break;
///     default:
///       showError('Prices could not be calculated');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Line or cart input failed the validation gate.
    ValidationError,

    /// Request JSON could not be read.
    InvalidPayload,

    /// Configuration could not be loaded or is invalid.
    ConfigError,

    /// The pricing engine hit a non-finite amount.
    PricingFault,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Core(CoreError::Validation(err))
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::InvalidPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = SessionError::from(ValidationError::Required {
            field: "productId".into(),
        });
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(
            err.to_string(),
            "Pricing error: Validation error: productId is required"
        );

        let err = SessionError::InvalidConfig("precision".into());
        assert_eq!(err.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn test_json_error_is_invalid_payload() {
        let err: SessionError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), ErrorCode::InvalidPayload);
    }

    #[test]
    fn test_code_wire_format() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::ValidationError).unwrap(),
            "\"VALIDATION_ERROR\""
        );
    }
}
