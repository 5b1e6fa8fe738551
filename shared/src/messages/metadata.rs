//! Run metadata captured at the start of a protocol run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProtocolMode, RunId, StationId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub station: StationId,
    pub mode: ProtocolMode,
    pub num_samples: u32,
    pub technician: String,
    pub started_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(
        station: StationId,
        mode: ProtocolMode,
        num_samples: u32,
        technician: impl Into<String>,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            station,
            mode,
            num_samples,
            technician: technician.into(),
            started_at: Utc::now(),
        }
    }

    /// Directory-friendly label, e.g. `station_b_20261016_0930`
    pub fn folder_label(&self) -> String {
        format!("{}_{}", self.station, self.started_at.format("%Y%m%d_%H%M"))
    }
}
