//! Station configuration
//!
//! Values are layered: built-in defaults, then the settings source
//! (`.env` and `STATION_*` environment variables), then command-line flags.

use serde::{Deserialize, Serialize};
use shared::{
    correct_sample_count, Microliters, ProtocolMode, RunId, RunMetadata, StationId, MAX_SAMPLES,
};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{StationError, StationResult};
use crate::traits::SettingsSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub run_id: RunId,
    pub station: StationId,
    pub technician: String,
    pub num_samples: u32,
    pub mode: ProtocolMode,
    /// Usable volume of the multichannel tips
    pub pipette_capacity: Microliters,
    pub tip_racks: u32,
    pub log_level: String,
    pub output_dir: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            run_id: RunId::new(),
            station: StationId::Extraction,
            technician: "unknown".to_string(),
            num_samples: 96 - 2,
            mode: ProtocolMode::Viral,
            pipette_capacity: 180.0,
            tip_racks: 2,
            log_level: "info".to_string(),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Command-line values that override everything else when present
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub num_samples: Option<u32>,
    pub mode: Option<ProtocolMode>,
    pub technician: Option<String>,
    pub tip_racks: Option<u32>,
    pub log_level: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl StationConfig {
    /// Defaults overlaid with whatever `source` provides
    pub fn from_settings(source: &dyn SettingsSource) -> StationResult<Self> {
        let mut config = Self::default();

        if let Some(value) = source.lookup("STATION_SAMPLES") {
            config.num_samples = parse_setting("STATION_SAMPLES", &value)?;
        }
        if let Some(value) = source.lookup("STATION_MODE") {
            config.mode = value.parse()?;
        }
        if let Some(value) = source.lookup("STATION_TECHNICIAN") {
            config.technician = value;
        }
        if let Some(value) = source.lookup("STATION_PIPETTE_CAPACITY") {
            config.pipette_capacity = parse_setting("STATION_PIPETTE_CAPACITY", &value)?;
        }
        if let Some(value) = source.lookup("STATION_TIP_RACKS") {
            config.tip_racks = parse_setting("STATION_TIP_RACKS", &value)?;
        }
        if let Some(value) = source.lookup("STATION_LOG_LEVEL") {
            config.log_level = value;
        }
        if let Some(value) = source.lookup("STATION_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(value);
        }
        if let Some(value) = source.lookup("STATION_RUN_ID") {
            config.run_id = RunId::parse(&value)?;
        }

        Ok(config)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(n) = overrides.num_samples {
            self.num_samples = n;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(technician) = overrides.technician {
            self.technician = technician;
        }
        if let Some(racks) = overrides.tip_racks {
            self.tip_racks = racks;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn validate(&self) -> StationResult<()> {
        if self.num_samples == 0 || self.num_samples > MAX_SAMPLES {
            return Err(StationError::configuration(format!(
                "sample count {} outside 1..={MAX_SAMPLES}",
                self.num_samples
            )));
        }
        if self.pipette_capacity <= 0.0 {
            return Err(StationError::configuration(format!(
                "pipette capacity must be positive, got {}",
                self.pipette_capacity
            )));
        }
        if self.tip_racks == 0 {
            return Err(StationError::configuration("at least one tip rack is required"));
        }
        Ok(())
    }

    /// Sample count rounded up to whole columns
    pub fn corrected_samples(&self) -> u32 {
        correct_sample_count(self.num_samples)
    }

    pub fn metadata(&self) -> RunMetadata {
        RunMetadata {
            run_id: self.run_id,
            ..RunMetadata::new(self.station, self.mode, self.num_samples, &self.technician)
        }
    }
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> StationResult<T> {
    value.trim().parse().map_err(|_| {
        StationError::configuration(format!("{key} has an invalid value: {value}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockSettingsSource;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> MockSettingsSource {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut mock = MockSettingsSource::new();
        mock.expect_lookup()
            .returning(move |key| values.get(key).cloned());
        mock
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = StationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.corrected_samples(), 96);
    }

    #[test]
    fn test_settings_override_defaults() {
        let config = StationConfig::from_settings(&source(&[
            ("STATION_SAMPLES", "24"),
            ("STATION_MODE", "P"),
            ("STATION_TECHNICIAN", "marta"),
            ("STATION_TIP_RACKS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.num_samples, 24);
        assert_eq!(config.mode, ProtocolMode::Pathogen);
        assert_eq!(config.technician, "marta");
        assert_eq!(config.tip_racks, 3);
        assert_eq!(config.pipette_capacity, 180.0);
    }

    #[test]
    fn test_flags_override_settings() {
        let config = StationConfig::from_settings(&source(&[("STATION_SAMPLES", "24")]))
            .unwrap()
            .apply(ConfigOverrides {
                num_samples: Some(40),
                ..Default::default()
            });
        assert_eq!(config.num_samples, 40);
        assert_eq!(config.corrected_samples(), 40);
    }

    #[test]
    fn test_bad_settings_are_configuration_errors() {
        assert!(matches!(
            StationConfig::from_settings(&source(&[("STATION_SAMPLES", "many")])),
            Err(StationError::Configuration { .. })
        ));
        assert!(matches!(
            StationConfig::from_settings(&source(&[("STATION_MODE", "Q")])),
            Err(StationError::Shared(_))
        ));
        assert!(matches!(
            StationConfig::from_settings(&source(&[("STATION_RUN_ID", "abc")])),
            Err(StationError::Shared(_))
        ));
    }

    #[test]
    fn test_sample_bounds() {
        for samples in [0, 95] {
            let config = StationConfig {
                num_samples: samples,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{samples} should be rejected");
        }
        let config = StationConfig {
            num_samples: 1,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_metadata_keeps_run_id() {
        let config = StationConfig::default();
        assert_eq!(config.metadata().run_id, config.run_id);
    }
}
