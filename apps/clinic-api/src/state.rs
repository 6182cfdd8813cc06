//! Shared application state.

use std::sync::Arc;

use vetpos_core::TaxRate;
use vetpos_db::Database;

use crate::config::ClinicConfig;

/// Handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ClinicConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ClinicConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.config.tax_rate()
    }
}
