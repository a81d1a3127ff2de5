//! # Pricing Configuration
//!
//! Tenant-wide defaults for calculations.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Request fields (highest priority, per calculation)                  │
//! │     precision, isInter, taxExempt, settings, beforeTax                  │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     TALLY_PRECISION=3                                                   │
//! │     TALLY_ROUNDING_ADJUSTMENT=true                                      │
//! │                                                                         │
//! │  3. TOML Config File                                                    │
//! │     ~/.config/tally/pricing.toml (Linux)                                │
//! │     ~/Library/Application Support/com.tally.pricing/pricing.toml (macOS)│
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                    │
//! │     precision 2, no rounding, cart-wide shipping tax                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [pricing]
//! precision = 2
//! tax_exempt = false
//! inter_state = false
//!
//! [settings]
//! rounding_adjustment = true
//! item_wise_shipping_tax = false
//!
//! [shipping]
//! before_tax = true
//! before_tax_percentage = 18.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_core::validation::{validate_percentage, validate_precision};
use tally_core::Settings;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Sections
// =============================================================================

/// Rounding and tax defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingSection {
    /// Decimal places for rounded amounts.
    #[serde(default = "default_precision")]
    pub precision: u32,

    /// Customer is tax exempt unless the request says otherwise.
    #[serde(default)]
    pub tax_exempt: bool,

    /// Default jurisdiction: inter-state when true.
    #[serde(default)]
    pub inter_state: bool,
}

fn default_precision() -> u32 {
    2
}

impl Default for PricingSection {
    fn default() -> Self {
        PricingSection {
            precision: default_precision(),
            tax_exempt: false,
            inter_state: false,
        }
    }
}

/// How shipping is charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingSection {
    /// Shipping is charged before tax and is itself taxed.
    #[serde(default)]
    pub before_tax: bool,

    /// Rate for cart-wide shipping tax.
    #[serde(default)]
    pub before_tax_percentage: f64,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete pricing configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub pricing: PricingSection,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub shipping: ShippingSection,
}

impl PricingConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pricing config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml_str(contents: &str) -> SessionResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> SessionResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;

        info!(?path, "Pricing config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        validate_precision(self.pricing.precision)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        validate_percentage("before_tax_percentage", self.shipping.before_tax_percentage)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    /// Applies overrides from `lookup` (the process environment in
    /// [`PricingConfig::load`]).
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("TALLY_PRECISION") {
            match value.trim().parse::<u32>() {
                Ok(precision) => {
                    debug!(precision, "Overriding precision from environment");
                    self.pricing.precision = precision;
                }
                Err(_) => warn!(value = %value, "Ignoring invalid TALLY_PRECISION"),
            }
        }

        if let Some(flag) = lookup_flag(&lookup, "TALLY_ROUNDING_ADJUSTMENT") {
            self.settings.rounding_adjustment = flag;
        }

        if let Some(flag) = lookup_flag(&lookup, "TALLY_ITEM_WISE_SHIPPING_TAX") {
            self.settings.item_wise_shipping_tax = flag;
        }

        if let Some(flag) = lookup_flag(&lookup, "TALLY_TAX_EXEMPT") {
            self.pricing.tax_exempt = flag;
        }

        if let Some(flag) = lookup_flag(&lookup, "TALLY_BEFORE_TAX_SHIPPING") {
            self.shipping.before_tax = flag;
        }

        if let Some(value) = lookup("TALLY_BEFORE_TAX_PERCENTAGE") {
            match value.trim().parse::<f64>() {
                Ok(pct) => {
                    debug!(pct, "Overriding shipping tax rate from environment");
                    self.shipping.before_tax_percentage = pct;
                }
                Err(_) => warn!(value = %value, "Ignoring invalid TALLY_BEFORE_TAX_PERCENTAGE"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pricing")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }
}

fn lookup_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let value = lookup(key)?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(key, value = %value, "Ignoring invalid boolean override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PricingConfig::default();
        assert_eq!(config.pricing.precision, 2);
        assert!(!config.settings.rounding_adjustment);
        assert!(!config.shipping.before_tax);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = PricingConfig::from_toml_str(
            r#"
            [settings]
            rounding_adjustment = true

            [shipping]
            before_tax = true
            before_tax_percentage = 18.0
            "#,
        )
        .unwrap();
        assert_eq!(config.pricing.precision, 2);
        assert!(config.settings.rounding_adjustment);
        assert!(!config.settings.item_wise_shipping_tax);
        assert_eq!(config.shipping.before_tax_percentage, 18.0);
    }

    #[test]
    fn test_invalid_toml_is_load_error() {
        let err = PricingConfig::from_toml_str("[pricing]\nprecision = \"two\"").unwrap_err();
        assert!(matches!(err, SessionError::ConfigLoadFailed(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = PricingConfig::default();
        config.apply_overrides(env(&[
            ("TALLY_PRECISION", "3"),
            ("TALLY_ROUNDING_ADJUSTMENT", "yes"),
            ("TALLY_ITEM_WISE_SHIPPING_TAX", "1"),
            ("TALLY_TAX_EXEMPT", "bogus"),
            ("TALLY_BEFORE_TAX_SHIPPING", "true"),
            ("TALLY_BEFORE_TAX_PERCENTAGE", "12.5"),
        ]));

        assert_eq!(config.pricing.precision, 3);
        assert!(config.settings.rounding_adjustment);
        assert!(config.settings.item_wise_shipping_tax);
        assert!(!config.pricing.tax_exempt);
        assert!(config.shipping.before_tax);
        assert_eq!(config.shipping.before_tax_percentage, 12.5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PricingConfig::default();
        config.pricing.precision = 40;
        assert!(matches!(config.validate(), Err(SessionError::InvalidConfig(_))));

        config.pricing.precision = 2;
        config.shipping.before_tax_percentage = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pricing.toml");

        let mut config = PricingConfig::default();
        config.pricing.precision = 3;
        config.settings.rounding_adjustment = true;
        config.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[pricing]"));
        assert!(contents.contains("[shipping]"));

        let loaded = PricingConfig::from_toml_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PricingConfig::load_or_default(Some(dir.path().join("absent.toml")));
        assert_eq!(config.pricing.precision, PricingConfig::default().pricing.precision);
    }
}
