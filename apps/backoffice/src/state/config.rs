//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`APOTHECA_*`)
//! 2. Config file (`apotheca.toml` in the platform config directory, or
//!    an explicit path)
//! 3. Defaults (this file)
//!
//! ```toml
//! [store]
//! name = "Shifa Pharmacy"
//! address = ["Main Bazaar", "Lahore"]
//! utc_offset_minutes = 300
//!
//! [inventory]
//! low_stock_threshold = 10
//! expiry_warning_days = 180
//!
//! [database]
//! path = "/var/lib/apotheca/apotheca.db"
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use apotheca_core::reporting::business_day;
use apotheca_core::{
    Money, DEFAULT_CUSTOMER_NAME, DEFAULT_EXPIRY_WARNING_DAYS, DEFAULT_LOW_STOCK_THRESHOLD,
};

const CONFIG_FILE: &str = "apotheca.toml";
const DATABASE_FILE: &str = "apotheca.db";

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub inventory: InventoryConfig,
    pub database: DatabaseConfig,
}

/// Shop identity and money formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store name (report titles)
    pub name: String,

    /// Address lines (printed under the title)
    pub address: Vec<String>,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Offset of the shop's local time from UTC. Sales are bucketed into
    /// calendar days in this offset.
    pub utc_offset_minutes: i32,

    /// Customer recorded when the cashier leaves the name blank
    pub default_customer_name: String,
}

/// Stock alert thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Fewer whole packs than this is "low stock"
    pub low_stock_threshold: i64,

    /// Expiring within this many days is "expiring soon"
    pub expiry_warning_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`. Empty means the platform data directory.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: "Apotheca Pharmacy".to_string(),
            address: Vec::new(),
            currency_code: "PKR".to_string(),
            currency_symbol: "PKR".to_string(),
            currency_decimals: 2,
            utc_offset_minutes: 5 * 60,
            default_customer_name: DEFAULT_CUSTOMER_NAME.to_string(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: PathBuf::new(),
            max_connections: 5,
        }
    }
}

impl AppConfig {
    /// Loads configuration: defaults, then `path` (or the platform
    /// `apotheca.toml` if it exists), then `APOTHECA_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => project_dirs()
                .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
                .filter(|p| p.exists()),
        };

        let mut config = match file {
            Some(file) => {
                tracing::debug!(path = %file.display(), "Loading config file");
                Self::from_file(&file)?
            }
            None => AppConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.resolve_database_path();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies environment overrides.
    ///
    /// ## Environment Variables
    /// - `APOTHECA_STORE_NAME`
    /// - `APOTHECA_DB_PATH`
    /// - `APOTHECA_UTC_OFFSET_MINUTES`
    /// - `APOTHECA_LOW_STOCK_THRESHOLD`
    /// - `APOTHECA_EXPIRY_WARNING_DAYS`
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: key.to_string(),
                    value,
                })
        }

        if let Some(name) = lookup("APOTHECA_STORE_NAME") {
            self.store.name = name;
        }
        if let Some(path) = lookup("APOTHECA_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(v) = lookup("APOTHECA_UTC_OFFSET_MINUTES") {
            self.store.utc_offset_minutes = parse("APOTHECA_UTC_OFFSET_MINUTES", v)?;
        }
        if let Some(v) = lookup("APOTHECA_LOW_STOCK_THRESHOLD") {
            self.inventory.low_stock_threshold = parse("APOTHECA_LOW_STOCK_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("APOTHECA_EXPIRY_WARNING_DAYS") {
            self.inventory.expiry_warning_days = parse("APOTHECA_EXPIRY_WARNING_DAYS", v)?;
        }
        Ok(())
    }

    fn resolve_database_path(&mut self) {
        if self.database.path.as_os_str().is_empty() {
            self.database.path = project_dirs()
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
                .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name is empty".to_string()));
        }
        if self.store.currency_decimals > 4 {
            return Err(ConfigError::Invalid(
                "store.currency_decimals must be at most 4".to_string(),
            ));
        }
        // Real-world offsets span -12:00 .. +14:00
        if !(-12 * 60..=14 * 60).contains(&self.store.utc_offset_minutes) {
            return Err(ConfigError::Invalid(format!(
                "store.utc_offset_minutes {} is out of range",
                self.store.utc_offset_minutes
            )));
        }
        if self.inventory.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "inventory.low_stock_threshold cannot be negative".to_string(),
            ));
        }
        if self.inventory.expiry_warning_days < 0 {
            return Err(ConfigError::Invalid(
                "inventory.expiry_warning_days cannot be negative".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The shop's UTC offset. Validation keeps it in range, so the
    /// fallback to UTC is never taken for a loaded config.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.store.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Calendar day of `ts` in the shop's timezone.
    pub fn business_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        business_day(ts, self.offset())
    }

    pub fn today(&self) -> NaiveDate {
        self.business_day(Utc::now())
    }

    /// Formats an amount as `PKR 1234.50`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(123450)), "PKR 1234.50");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let store = &self.store;
        let divisor = 10_i64.pow(store.currency_decimals as u32);
        let whole = minor / divisor;
        let frac = (minor % divisor).abs();

        format!(
            "{}{} {}",
            if minor < 0 { "-" } else { "" },
            store.currency_symbol,
            if store.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = store.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "apotheca", "backoffice")
}
