use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a budgeting session. Every field has a default, so an empty
/// JSON object is a valid config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// How external records are fetched and mapped into expenses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// URL returning a JSON array of records. Imports fail until one is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Maximum number of records taken from one fetch
    pub limit: usize,
    /// Field holding the record's identifier
    pub id_field: String,
    /// Field holding the record's amount, as a number or numeric string
    pub amount_field: String,
    /// Prefix for the description of imported expenses
    pub description_prefix: String,
    pub timeout_secs: u64,
}

impl ImportConfig {
    pub const DEFAULT_LIMIT: usize = 3;

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            limit: Self::DEFAULT_LIMIT,
            id_field: "id".to_string(),
            amount_field: "amount".to_string(),
            description_prefix: "Transaction".to_string(),
            timeout_secs: 10,
        }
    }
}
