//! Environment-backed settings
//!
//! Settings are read from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over .env file values.
//!
//! ## Recognised keys
//! - `STATION_SAMPLES`: number of samples in the run
//! - `STATION_MODE`: `V` (viral) or `P` (pathogen)
//! - `STATION_TECHNICIAN`: name recorded in the run metadata
//! - `STATION_PIPETTE_CAPACITY`: usable volume of the multichannel tips
//! - `STATION_TIP_RACKS`: racks loaded per pipette
//! - `STATION_LOG_LEVEL`: tracing level
//! - `STATION_OUTPUT_DIR`: where run logs are written
//! - `STATION_RUN_ID`: fixed run id instead of a generated one

use crate::traits::SettingsSource;

pub struct EnvSettingsSource;

impl EnvSettingsSource {
    /// Load `.env` if present. Missing files are not an error, and
    /// variables already set in the environment are left untouched.
    pub fn new() -> Self {
        let _ = dotenv::dotenv();
        Self
    }
}

impl Default for EnvSettingsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsSource for EnvSettingsSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}
