//! # Configuration State
//!
//! Terminal configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TIENDA_TENANT_ID, TIENDA_STORE_NAME, TIENDA_MODE,                  │
//! │     TIENDA_TAX_RATE, TIENDA_CATALOG_PATH                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tienda/tienda.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tienda.terminal/tienda.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sales mode, no tax                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! tenant_id = "store-001"
//! store_name = "Downtown Branch"
//! mode = "sales"            # sales | quotation
//! default_tax_rate = "16"
//! catalog_path = "/var/lib/tienda/catalog.json"
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tienda_core::StockPolicy;

/// Tenant used when nothing is configured.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown terminal mode: '{0}'. Valid options: sales, quotation")]
    InvalidMode(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Terminal Mode
// =============================================================================

/// What the terminal is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMode {
    /// Point of sale: sells from stock.
    #[default]
    Sales,

    /// Quotation builder: prices carts without reserving stock.
    Quotation,
}

impl TerminalMode {
    pub fn stock_policy(&self) -> StockPolicy {
        match self {
            TerminalMode::Sales => StockPolicy::Enforce,
            TerminalMode::Quotation => StockPolicy::Unlimited,
        }
    }
}

impl std::fmt::Display for TerminalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalMode::Sales => write!(f, "sales"),
            TerminalMode::Quotation => write!(f, "quotation"),
        }
    }
}

impl std::str::FromStr for TerminalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" | "sale" | "pos" => Ok(TerminalMode::Sales),
            "quotation" | "quote" | "quotes" => Ok(TerminalMode::Quotation),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

// =============================================================================
// Config State
// =============================================================================

/// Terminal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Tenant the terminal commits documents for.
    pub tenant_id: String,

    /// Store name (shown in cart views)
    pub store_name: String,

    pub mode: TerminalMode,

    /// Tax rate pre-filled in every new cart, as the operator would type
    /// it, e.g. "16" or "8.25". Empty means no tax.
    pub default_tax_rate: String,

    /// Catalog snapshot loaded at startup.
    pub catalog_path: Option<PathBuf>,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            store_name: "Tienda".to_string(),
            mode: TerminalMode::Sales,
            default_tax_rate: String::new(),
            catalog_path: None,
        }
    }
}

impl ConfigState {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tienda.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.mode.stock_policy()
    }

    /// Applies `TIENDA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("TIENDA_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant ID from environment");
            self.tenant_id = id;
        }

        if let Some(name) = var("TIENDA_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(mode) = var("TIENDA_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding terminal mode from environment");
                    self.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown terminal mode in environment"),
            }
        }

        // Kept verbatim; the cart normalizes it like any typed rate
        if let Some(rate) = var("TIENDA_TAX_RATE") {
            self.default_tax_rate = rate;
        }

        if let Some(path) = var("TIENDA_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tienda", "terminal")
            .map(|dirs| dirs.config_dir().join("tienda.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_terminal_mode_parsing() {
        assert_eq!("sales".parse::<TerminalMode>().unwrap(), TerminalMode::Sales);
        assert_eq!("Quotation".parse::<TerminalMode>().unwrap(), TerminalMode::Quotation);
        assert_eq!("quote".parse::<TerminalMode>().unwrap(), TerminalMode::Quotation);
        assert!("invoice".parse::<TerminalMode>().is_err());
    }

    #[test]
    fn test_mode_selects_stock_policy() {
        assert_eq!(TerminalMode::Sales.stock_policy(), StockPolicy::Enforce);
        assert_eq!(TerminalMode::Quotation.stock_policy(), StockPolicy::Unlimited);
    }

    #[test]
    fn test_default_config() {
        let config = ConfigState::default();
        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(config.mode, TerminalMode::Sales);
        assert!(config.default_tax_rate.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigState::from_toml(
            r#"
            store_name = "Downtown Branch"
            mode = "quotation"
            default_tax_rate = "16"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Downtown Branch");
        assert_eq!(config.mode, TerminalMode::Quotation);
        assert_eq!(config.default_tax_rate, "16");
        assert_eq!(config.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(config.catalog_path, None);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            ConfigState::from_toml("mode = \"invoice\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = ConfigState::from_toml("tenant_id = \"from-file\"").unwrap();
        let env = HashMap::from([
            ("TIENDA_TENANT_ID", "from-env"),
            ("TIENDA_MODE", "quotation"),
            ("TIENDA_TAX_RATE", "8,25"),
            ("TIENDA_CATALOG_PATH", "/tmp/catalog.json"),
        ]);

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tenant_id, "from-env");
        assert_eq!(config.mode, TerminalMode::Quotation);
        assert_eq!(config.default_tax_rate, "8,25");
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_unknown_mode_override_is_ignored() {
        let mut config = ConfigState::default();
        config.apply_overrides(|key| (key == "TIENDA_MODE").then(|| "invoice".to_string()));
        assert_eq!(config.mode, TerminalMode::Sales);
    }

    #[test]
    fn test_blank_tenant_fails_validation() {
        let config = ConfigState {
            tenant_id: "  ".to_string(),
            ..ConfigState::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ConfigState::default()).unwrap();
        assert!(toml_str.contains("tenant_id"));
        assert!(toml_str.contains("mode = \"sales\""));
    }
}
