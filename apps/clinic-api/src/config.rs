//! Clinic API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use vetpos_core::validation::validate_tax_rate_bps;
use vetpos_core::TaxRate;

/// Clinic API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Sales tax in basis points (1600 = 16%). 0 disables tax.
    pub sale_tax_bps: u32,
}

impl ClinicConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ClinicConfig {
            http_port: lookup("HTTP_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "./vetpos.db".to_string()),

            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            sale_tax_bps: lookup("SALE_TAX_BPS")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALE_TAX_BPS".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        validate_tax_rate_bps(config.sale_tax_bps)
            .map_err(|e| ConfigError::OutOfRange("SALE_TAX_BPS".to_string(), e.to_string()))?;

        Ok(config)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sale_tax_bps)
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        ClinicConfig {
            http_port: 8080,
            database_path: "./vetpos.db".to_string(),
            db_max_connections: 5,
            sale_tax_bps: 0,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("{0} out of range: {1}")]
    OutOfRange(String, String),
}
