//! Configuration loading and representation.

use std::path::{Path, PathBuf};

use stockroom_core::Money;
use stockroom_inventory::{LOW_STOCK_THRESHOLD, TOP_SPENDER_THRESHOLD};

use crate::error::ConfigError;

pub const ENV_DATA_DIR: &str = "STOCKROOM_DATA_DIR";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOCKROOM_LOW_STOCK_THRESHOLD";
pub const ENV_TOP_SPENDER_THRESHOLD: &str = "STOCKROOM_TOP_SPENDER_THRESHOLD";

/// Where the flat files live and the reporting thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub customer_file: String,
    pub ledger_file: String,
    pub report_file: String,
    pub low_stock_threshold: i64,
    pub top_spender_threshold: Money,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            customer_file: "Customer_Information.csv".to_string(),
            ledger_file: "purchase_records.csv".to_string(),
            report_file: "inventory_report.txt".to_string(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            top_spender_threshold: TOP_SPENDER_THRESHOLD,
        }
    }
}

impl StoreConfig {
    /// Defaults rooted at `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            config.low_stock_threshold = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: ENV_LOW_STOCK_THRESHOLD,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }

        if let Some(raw) = lookup(ENV_TOP_SPENDER_THRESHOLD) {
            config.top_spender_threshold = raw.parse().map_err(|e| ConfigError::Invalid {
                key: ENV_TOP_SPENDER_THRESHOLD,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }

        tracing::debug!(data_dir = %config.data_dir.display(), "store config loaded");
        Ok(config)
    }

    pub fn customer_path(&self) -> PathBuf {
        self.data_dir.join(&self.customer_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(&self.report_file)
    }
}
