//! Run-log sinks
//!
//! `TsvRunLog` writes the station time log consumed by the lab's log
//! collection scripts; `MemoryRunLog` keeps records for tests and JSON
//! reports.

use shared::{station_debug, StationId, StepRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StationResult;
use crate::traits::RunLogSink;

pub const TSV_HEADER: &str = "STEP\texecution\tdescription\twait_time\texecution_time";

/// Tab-separated time log, one row per step
pub struct TsvRunLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl TsvRunLog {
    /// Create (or truncate) `path` and write the header row
    pub fn create(path: impl AsRef<Path>) -> StationResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{TSV_HEADER}")?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `H:MM:SS.ffffff`, the elapsed format the log tooling parses
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}.{:06}", elapsed.subsec_micros())
}

pub fn tsv_row(record: &StepRecord) -> String {
    let executed = if record.executed { "True" } else { "False" };
    let elapsed = record.elapsed.map(format_elapsed).unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.step_number, executed, record.description, record.wait_time_seconds, elapsed
    )
}

impl RunLogSink for TsvRunLog {
    fn record(&mut self, record: &StepRecord) -> StationResult<()> {
        writeln!(self.writer, "{}", tsv_row(record))?;
        Ok(())
    }

    fn finish(&mut self) -> StationResult<()> {
        self.writer.flush()?;
        station_debug!(StationId::current(), path = %self.path.display(), "Time log flushed");
        Ok(())
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemoryRunLog {
    records: Vec<StepRecord>,
    finished: bool,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn to_json(&self) -> StationResult<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

impl RunLogSink for MemoryRunLog {
    fn record(&mut self, record: &StepRecord) -> StationResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> StationResult<()> {
        self.finished = true;
        Ok(())
    }
}
