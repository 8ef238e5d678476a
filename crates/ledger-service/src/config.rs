//! # Ledger Configuration
//!
//! Tax rate, settlement rules and credit note numbering.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LEDGER_ITBIS_BPS=1800                                              │
//! │     LEDGER_NC_PREFIX=NC                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sales-ledger/ledger.toml (Linux)                         │
//! │     ~/Library/Application Support/do.ledger.sales-ledger/ledger.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ITBIS 18%, one centavo split tolerance, NC-00000001                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ledger.toml
//! [tax]
//! itbis_rate_bps = 1800
//!
//! [rules]
//! mixed_split_tolerance_cents = 1
//! max_items_per_sale = 500
//!
//! [numbering]
//! credit_note_prefix = "NC"
//! credit_note_width = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use ledger_core::validation::validate_tax_rate_bps;
use ledger_core::{LedgerRules, Money, TaxRate, ITBIS_RATE_BPS, MAX_SALE_ITEMS, MIXED_SPLIT_TOLERANCE_CENTS};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Tax Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSettings {
    /// ITBIS rate in basis points (1800 = 18%).
    #[serde(default = "default_itbis_rate")]
    pub itbis_rate_bps: u32,
}

fn default_itbis_rate() -> u32 {
    ITBIS_RATE_BPS
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            itbis_rate_bps: default_itbis_rate(),
        }
    }
}

// =============================================================================
// Rule Settings
// =============================================================================

/// Settlement rules applied when a sale is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Allowed gap between `cash + credit` and `total` on a mixed sale.
    #[serde(default = "default_tolerance")]
    pub mixed_split_tolerance_cents: i64,

    /// Maximum lines on one sale or credit note.
    #[serde(default = "default_max_items")]
    pub max_items_per_sale: usize,
}

fn default_tolerance() -> i64 {
    MIXED_SPLIT_TOLERANCE_CENTS
}

fn default_max_items() -> usize {
    MAX_SALE_ITEMS
}

impl Default for RuleSettings {
    fn default() -> Self {
        RuleSettings {
            mixed_split_tolerance_cents: default_tolerance(),
            max_items_per_sale: default_max_items(),
        }
    }
}

// =============================================================================
// Numbering Settings
// =============================================================================

/// Credit note numbering (`NC-00000042`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingSettings {
    #[serde(default = "default_prefix")]
    pub credit_note_prefix: String,

    /// Zero-padded width of the sequence part.
    #[serde(default = "default_width")]
    pub credit_note_width: usize,
}

fn default_prefix() -> String {
    "NC".to_string()
}

fn default_width() -> usize {
    8
}

impl Default for NumberingSettings {
    fn default() -> Self {
        NumberingSettings {
            credit_note_prefix: default_prefix(),
            credit_note_width: default_width(),
        }
    }
}

impl NumberingSettings {
    /// Formats a credit note number from its sequence value.
    pub fn credit_note_number(&self, sequence: u64) -> String {
        format!(
            "{}-{:0width$}",
            self.credit_note_prefix,
            sequence,
            width = self.credit_note_width
        )
    }
}

// =============================================================================
// Main Ledger Configuration
// =============================================================================

/// Complete ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub tax: TaxSettings,

    #[serde(default)]
    pub rules: RuleSettings,

    #[serde(default)]
    pub numbering: NumberingSettings,
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ledger.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ServiceResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ServiceError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        validate_tax_rate_bps(self.tax.itbis_rate_bps)
            .map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;

        if self.rules.mixed_split_tolerance_cents < 0 {
            return Err(ServiceError::InvalidConfig(
                "mixed_split_tolerance_cents must not be negative".into(),
            ));
        }

        if self.rules.max_items_per_sale == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_items_per_sale must be greater than 0".into(),
            ));
        }

        if self.numbering.credit_note_prefix.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "credit_note_prefix is required".into(),
            ));
        }

        if !(1..=20).contains(&self.numbering.credit_note_width) {
            return Err(ServiceError::InvalidConfig(format!(
                "credit_note_width must be between 1 and 20, got {}",
                self.numbering.credit_note_width
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(bps) = std::env::var("LEDGER_ITBIS_BPS") {
            match bps.parse::<u32>() {
                Ok(v) => {
                    debug!(itbis_rate_bps = v, "Overriding ITBIS rate from environment");
                    self.tax.itbis_rate_bps = v;
                }
                Err(_) => warn!(value = %bps, "Ignoring non-numeric LEDGER_ITBIS_BPS"),
            }
        }

        if let Ok(cents) = std::env::var("LEDGER_MIXED_TOLERANCE_CENTS") {
            match cents.parse::<i64>() {
                Ok(v) => {
                    debug!(mixed_split_tolerance_cents = v, "Overriding mixed split tolerance from environment");
                    self.rules.mixed_split_tolerance_cents = v;
                }
                Err(_) => warn!(value = %cents, "Ignoring non-numeric LEDGER_MIXED_TOLERANCE_CENTS"),
            }
        }

        if let Ok(max) = std::env::var("LEDGER_MAX_ITEMS") {
            match max.parse::<usize>() {
                Ok(v) => {
                    debug!(max_items_per_sale = v, "Overriding item limit from environment");
                    self.rules.max_items_per_sale = v;
                }
                Err(_) => warn!(value = %max, "Ignoring non-numeric LEDGER_MAX_ITEMS"),
            }
        }

        if let Ok(prefix) = std::env::var("LEDGER_NC_PREFIX") {
            debug!(prefix = %prefix, "Overriding credit note prefix from environment");
            self.numbering.credit_note_prefix = prefix;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("do", "ledger", "sales-ledger")
            .map(|dirs| dirs.config_dir().join("ledger.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Converts to the rules consumed by ledger-core.
    pub fn rules(&self) -> LedgerRules {
        LedgerRules {
            itbis_rate: TaxRate::from_bps(self.tax.itbis_rate_bps),
            mixed_split_tolerance: Money::from_cents(self.rules.mixed_split_tolerance_cents),
            max_items: self.rules.max_items_per_sale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    const ENV_VARS: [&str; 4] = [
        "LEDGER_ITBIS_BPS",
        "LEDGER_MIXED_TOLERANCE_CENTS",
        "LEDGER_MAX_ITEMS",
        "LEDGER_NC_PREFIX",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialises tests that read or write the process environment.
    fn env_guard() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    fn missing_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.tax.itbis_rate_bps, 1800);
        assert_eq!(config.rules.mixed_split_tolerance_cents, 1);
        assert_eq!(config.numbering.credit_note_prefix, "NC");
        assert!(config.validate().is_ok());
        assert_eq!(config.rules(), LedgerRules::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LedgerConfig::default();

        config.tax.itbis_rate_bps = 10_001;
        assert!(matches!(config.validate(), Err(ServiceError::InvalidConfig(_))));

        config.tax.itbis_rate_bps = 1600;
        config.rules.mixed_split_tolerance_cents = -1;
        assert!(config.validate().is_err());

        config.rules.mixed_split_tolerance_cents = 0;
        config.rules.max_items_per_sale = 0;
        assert!(config.validate().is_err());

        config.rules.max_items_per_sale = 10;
        config.numbering.credit_note_prefix = "  ".to_string();
        assert!(config.validate().is_err());

        config.numbering.credit_note_prefix = "B04".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LedgerConfig = toml::from_str("[tax]\nitbis_rate_bps = 1600\n").unwrap();
        assert_eq!(config.tax.itbis_rate_bps, 1600);
        assert_eq!(config.rules.max_items_per_sale, MAX_SALE_ITEMS);
        assert_eq!(config.numbering.credit_note_width, 8);
        assert_eq!(config.rules().itbis_rate, TaxRate::from_bps(1600));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&LedgerConfig::default()).unwrap();
        assert!(toml_str.contains("[tax]"));
        assert!(toml_str.contains("[numbering]"));
    }

    #[test]
    fn test_save_and_load_from_explicit_path() {
        let _env = env_guard();
        let path = std::env::temp_dir().join(format!("ledger-config-{}.toml", std::process::id()));
        let mut config = LedgerConfig::default();
        config.rules.mixed_split_tolerance_cents = 5;
        config.save(Some(path.clone())).unwrap();

        let loaded = LedgerConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.rules.mixed_split_tolerance_cents, 5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let _env = env_guard();
        let path = std::env::temp_dir().join(format!("ledger-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[tax]\nitbis_rate_bps = \"many\"\n").unwrap();

        let config = LedgerConfig::load_or_default(Some(path.clone()));
        assert_eq!(config.tax.itbis_rate_bps, 1800);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _env = env_guard();
        std::env::set_var("LEDGER_ITBIS_BPS", "1600");
        std::env::set_var("LEDGER_NC_PREFIX", "B04");
        std::env::set_var("LEDGER_MAX_ITEMS", "25");

        let config = LedgerConfig::load(Some(missing_file("ledger-env"))).unwrap();
        assert_eq!(config.tax.itbis_rate_bps, 1600);
        assert_eq!(config.numbering.credit_note_prefix, "B04");
        assert_eq!(config.rules.max_items_per_sale, 25);
        assert_eq!(config.rules.mixed_split_tolerance_cents, MIXED_SPLIT_TOLERANCE_CENTS);

        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_override_out_of_range_fails_load() {
        let _env = env_guard();
        std::env::set_var("LEDGER_ITBIS_BPS", "20000");

        let result = LedgerConfig::load(Some(missing_file("ledger-env-range")));
        assert!(matches!(result, Err(ServiceError::InvalidConfig(_))));

        std::env::remove_var("LEDGER_ITBIS_BPS");
    }

    #[test]
    fn test_non_numeric_env_overrides_are_ignored() {
        let _env = env_guard();
        std::env::set_var("LEDGER_ITBIS_BPS", "dieciocho");
        std::env::set_var("LEDGER_MIXED_TOLERANCE_CENTS", "uno");
        std::env::set_var("LEDGER_MAX_ITEMS", "-3");

        let config = LedgerConfig::load(Some(missing_file("ledger-env-junk"))).unwrap();
        assert_eq!(config, LedgerConfig::default());

        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_credit_note_number() {
        let numbering = NumberingSettings::default();
        assert_eq!(numbering.credit_note_number(42), "NC-00000042");

        let short = NumberingSettings {
            credit_note_prefix: "B04".to_string(),
            credit_note_width: 3,
        };
        assert_eq!(short.credit_note_number(7), "B04-007");
        assert_eq!(short.credit_note_number(12345), "B04-12345");
    }
}
