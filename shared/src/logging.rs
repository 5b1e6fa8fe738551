//! Shared logging utilities for consistent tracing across all stations

use crate::messages::RunMetadata;
use crate::types::{RunId, StationId};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

/// Target of the simulated robot's per-primitive command log
const ACTUATOR_TARGET: &str = "station::services::simulated_actuator";

/// Build the per-crate filter directive for `station`
fn filter_directive(station: &StationId, log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    match station {
        StationId::Planner => format!("station={base_level},shared={base_level}"),
        StationId::SamplePrep | StationId::Extraction | StationId::PcrSetup => {
            // one line per aspirate/dispense, only wanted when tracing
            let actuator_level = if base_level == "trace" { "trace" } else { "info" };
            format!("station={base_level},shared={base_level},{ACTUATOR_TARGET}={actuator_level}")
        }
    }
}

/// Initialize tracing subscriber with an explicit level (`RUST_LOG` style)
/// Uses the global station ID, so call `StationId::init` first
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = filter_directive(StationId::current(), log_level);

    // try_init so tests and repeated CLI invocations in one process don't panic
    let _ = fmt()
        .with_env_filter(EnvFilter::new(&env_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for station-aware info logging
#[macro_export]
macro_rules! station_info {
    ($station_id:expr, $($arg:tt)*) => {
        tracing::info!(
            station = %$station_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for station-aware warning logging
#[macro_export]
macro_rules! station_warn {
    ($station_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            station = %$station_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for station-aware error logging
#[macro_export]
macro_rules! station_error {
    ($station_id:expr, $($arg:tt)*) => {
        tracing::error!(
            station = %$station_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for station-aware debug logging
#[macro_export]
macro_rules! station_debug {
    ($station_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            station = %$station_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Run opened on a station
pub fn log_run_started(metadata: &RunMetadata) {
    info!(
        station = %metadata.station,
        run = %metadata.run_id,
        timestamp = format_timestamp(),
        "Run started: {} mode, {} samples, technician {}",
        metadata.mode,
        metadata.num_samples,
        metadata.technician
    );
}

/// Protocol step finished and logged
pub fn log_step_completed(station_id: &StationId, run_id: &RunId, step: u32, elapsed: Duration) {
    info!(
        station = %station_id,
        run = %run_id,
        step,
        timestamp = format_timestamp(),
        "Step {} done in {:.1}s",
        step,
        elapsed.as_secs_f64()
    );
}

/// Protocol step aborted; no time-log record is written for it
pub fn log_step_failed(
    station_id: &StationId,
    run_id: &RunId,
    step: u32,
    error: &dyn std::fmt::Display,
) {
    crate::station_error!(
        station_id,
        run = %run_id,
        step,
        error = %error,
        "Step {} failed: {}",
        step,
        error
    );
}

/// Run closed after the time log was flushed
pub fn log_run_finished(station_id: &StationId, run_id: &RunId, steps: usize, elapsed: Duration) {
    info!(
        station = %station_id,
        run = %run_id,
        timestamp = format_timestamp(),
        "Run finished: {} steps in {:.1}s",
        steps,
        elapsed.as_secs_f64()
    );
}
