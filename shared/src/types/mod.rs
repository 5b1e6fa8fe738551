//! Core types used across the station binaries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::errors::SharedError;

/// Global station ID singleton - set once at startup
static STATION_ID: OnceLock<StationId> = OnceLock::new();

/// Volumes are expressed in microliters throughout
pub type Microliters = f64;

/// Number of tips on a multichannel head; one column of a 96-well plate
pub const CHANNEL_WIDTH: u32 = 8;

/// Largest sample count a single run accepts
pub const MAX_SAMPLES: u32 = 94;

/// Physical station a process is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationId {
    /// Sample preparation (station A)
    SamplePrep,
    /// Reagent filling and extraction (station B)
    Extraction,
    /// qPCR plate setup (station C)
    PcrSetup,
    /// Offline tooling such as the recipe calculator
    Planner,
}

impl StationId {
    /// Initialize the global station ID
    pub fn init(id: StationId) -> &'static StationId {
        STATION_ID.get_or_init(|| id)
    }

    /// Get the global station ID, falling back to `Planner` when no station was initialized
    pub fn current() -> &'static StationId {
        STATION_ID.get_or_init(|| StationId::Planner)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationId::SamplePrep => write!(f, "station_a"),
            StationId::Extraction => write!(f, "station_b"),
            StationId::PcrSetup => write!(f, "station_c"),
            StationId::Planner => write!(f, "planner"),
        }
    }
}

impl std::str::FromStr for StationId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" | "station_a" => Ok(StationId::SamplePrep),
            "b" | "station_b" => Ok(StationId::Extraction),
            "c" | "station_c" => Ok(StationId::PcrSetup),
            "planner" => Ok(StationId::Planner),
            _ => Err(SharedError::InvalidConfig {
                field: "station".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Extraction chemistry a run is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolMode {
    /// Viral RNA extraction ("V")
    Viral,
    /// Pathogen extraction ("P")
    Pathogen,
}

impl ProtocolMode {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolMode::Viral => "V",
            ProtocolMode::Pathogen => "P",
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolMode::Viral => write!(f, "viral"),
            ProtocolMode::Pathogen => write!(f, "pathogen"),
        }
    }
}

impl std::str::FromStr for ProtocolMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "V" | "VIRAL" => Ok(ProtocolMode::Viral),
            "P" | "PATHOGEN" => Ok(ProtocolMode::Pathogen),
            _ => Err(SharedError::InvalidMode { input: s.to_string() }),
        }
    }
}

/// Unique identifier of one protocol run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Result<Self, SharedError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| SharedError::InvalidUuid { input: input.to_string() })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a raw sample count up to a whole number of columns
pub fn correct_sample_count(raw: u32) -> u32 {
    raw.div_ceil(CHANNEL_WIDTH) * CHANNEL_WIDTH
}

/// Number of plate columns needed for `raw` samples
pub fn column_count(raw: u32) -> u32 {
    raw.div_ceil(CHANNEL_WIDTH)
}
