//! # Ledger Configuration
//!
//! Configuration for the engines and the store they run on.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPLEDGER_DB_PATH=/data/ledger.db                                 │
//! │     SHOPLEDGER_ENFORCE_BALANCE=true                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopledger/shopledger.toml (Linux)                       │
//! │     ~/Library/Application Support/com.shopledger.shopledger/... (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "shopledger.db"
//! max_connections = 5
//!
//! [analytics]
//! cache_ttl_secs = 300
//! no_movement_days = 7
//! best_seller_percentile = 90.0
//! low_sales_percentile = 20.0
//! stagnant_velocity = 0.5
//! max_alerts = 10
//! top_products = 5
//!
//! [finance]
//! enforce_cash_balance = false
//!
//! [notifications]
//! channel_capacity = 256
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use shopledger_core::analytics::ClassificationPolicy;
use shopledger_db::DbConfig;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `:memory:` for a throwaway database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("shopledger.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// Pool configuration for these settings.
    pub fn db_config(&self) -> DbConfig {
        if self.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(&self.path).max_connections(self.max_connections)
    }
}

// =============================================================================
// Analytics Settings
// =============================================================================

/// Cache lifetime and classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_no_movement_days")]
    pub no_movement_days: i64,

    #[serde(default = "default_best_seller_percentile")]
    pub best_seller_percentile: f64,

    #[serde(default = "default_low_sales_percentile")]
    pub low_sales_percentile: f64,

    #[serde(default = "default_stagnant_velocity")]
    pub stagnant_velocity: f64,

    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,

    #[serde(default = "default_top_products")]
    pub top_products: usize,
}

fn default_cache_ttl() -> u64 {
    300
}
fn default_no_movement_days() -> i64 {
    7
}
fn default_best_seller_percentile() -> f64 {
    90.0
}
fn default_low_sales_percentile() -> f64 {
    20.0
}
fn default_stagnant_velocity() -> f64 {
    0.5
}
fn default_max_alerts() -> usize {
    10
}
fn default_top_products() -> usize {
    5
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        AnalyticsSettings {
            cache_ttl_secs: default_cache_ttl(),
            no_movement_days: default_no_movement_days(),
            best_seller_percentile: default_best_seller_percentile(),
            low_sales_percentile: default_low_sales_percentile(),
            stagnant_velocity: default_stagnant_velocity(),
            max_alerts: default_max_alerts(),
            top_products: default_top_products(),
        }
    }
}

impl AnalyticsSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn policy(&self) -> ClassificationPolicy {
        ClassificationPolicy {
            no_movement_days: self.no_movement_days,
            best_seller_percentile: self.best_seller_percentile,
            low_sales_percentile: self.low_sales_percentile,
            stagnant_velocity: self.stagnant_velocity,
            max_alerts: self.max_alerts,
            top_products: self.top_products,
        }
    }
}

// =============================================================================
// Finance & Notification Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinanceSettings {
    /// Refuse paid expenses (stock purchases included) that exceed the
    /// current cash balance.
    #[serde(default)]
    pub enforce_cash_balance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Broadcast buffer. Slow subscribers lag past this many events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub analytics: AnalyticsSettings,

    #[serde(default)]
    pub finance: FinanceSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl LedgerConfig {
    /// Configuration for tests and demos: in-memory store, defaults elsewhere.
    pub fn in_memory() -> Self {
        LedgerConfig {
            database: DatabaseSettings {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shopledger.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
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
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Ledger config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(EngineError::Config("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(EngineError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.notifications.channel_capacity == 0 {
            return Err(EngineError::Config(
                "notifications.channel_capacity must be greater than 0".into(),
            ));
        }

        let a = &self.analytics;
        for (name, value) in [
            ("best_seller_percentile", a.best_seller_percentile),
            ("low_sales_percentile", a.low_sales_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "analytics.{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }

        if a.low_sales_percentile >= a.best_seller_percentile {
            return Err(EngineError::Config(
                "analytics.low_sales_percentile must be below best_seller_percentile".into(),
            ));
        }

        if a.no_movement_days <= 0 || a.stagnant_velocity < 0.0 {
            return Err(EngineError::Config(
                "analytics thresholds must be positive".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("SHOPLEDGER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("SHOPLEDGER_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Invalid SHOPLEDGER_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(ttl) = std::env::var("SHOPLEDGER_ANALYTICS_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(t) => {
                    debug!(ttl_secs = t, "Overriding analytics cache TTL from environment");
                    self.analytics.cache_ttl_secs = t;
                }
                Err(_) => warn!(value = %ttl, "Invalid SHOPLEDGER_ANALYTICS_TTL_SECS"),
            }
        }

        if let Ok(flag) = std::env::var("SHOPLEDGER_ENFORCE_BALANCE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.finance.enforce_cash_balance = true,
                "0" | "false" | "no" | "off" => self.finance.enforce_cash_balance = false,
                _ => warn!(value = %flag, "Unknown SHOPLEDGER_ENFORCE_BALANCE value"),
            }
        }

        if let Ok(capacity) = std::env::var("SHOPLEDGER_CHANNEL_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                self.notifications.channel_capacity = c;
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopledger", "shopledger")
            .map(|dirs| dirs.config_dir().join("shopledger.toml"))
    }
}
