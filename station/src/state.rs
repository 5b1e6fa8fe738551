//! Run-scoped state
//!
//! A `RunContext` is created when a run starts, mutated while it executes,
//! and consumed into a `RunSummary` when it ends. Nothing in it outlives
//! the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Microliters, RunMetadata};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::core::reservoir::Reagent;
use crate::core::tips::{Mount, Pipette, TipTracker};
use crate::error::{StationError, StationResult};

/// One entry of the protocol step table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStep {
    pub number: u32,
    pub description: String,
    pub execute: bool,
    pub wait_time_seconds: u64,
    pub elapsed: Option<Duration>,
}

impl ProtocolStep {
    pub fn new(number: u32, description: impl Into<String>) -> Self {
        Self {
            number,
            description: description.into(),
            execute: true,
            wait_time_seconds: 0,
            elapsed: None,
        }
    }

    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait_time_seconds = seconds;
        self
    }

    pub fn skip(mut self) -> Self {
        self.execute = false;
        self
    }
}

/// End-of-run usage of one reagent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentUsage {
    pub name: String,
    pub wells_used: usize,
    pub well_count: usize,
    pub abandoned: Microliters,
    pub remaining: Microliters,
}

impl From<&Reagent> for ReagentUsage {
    fn from(reagent: &Reagent) -> Self {
        Self {
            name: reagent.name().to_string(),
            wells_used: reagent.current_well_index() + 1,
            well_count: reagent.well_count(),
            abandoned: reagent.total_abandoned(),
            remaining: reagent.remaining_total(),
        }
    }
}

/// What a finished run reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub metadata: RunMetadata,
    pub steps: Vec<ProtocolStep>,
    pub reagents: Vec<ReagentUsage>,
    pub tips_used: BTreeMap<String, u32>,
    pub total_elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

/// Mutable state of one protocol run
#[derive(Debug)]
pub struct RunContext {
    metadata: RunMetadata,
    steps: BTreeMap<u32, ProtocolStep>,
    tips: HashMap<Mount, TipTracker>,
    started: Instant,
}

impl RunContext {
    pub fn new(metadata: RunMetadata, steps: Vec<ProtocolStep>) -> Self {
        Self {
            metadata,
            steps: steps.into_iter().map(|s| (s.number, s)).collect(),
            tips: HashMap::new(),
            started: Instant::now(),
        }
    }

    /// Start tracking tips for `pipette` with `racks` full racks loaded
    pub fn register_pipette(&mut self, pipette: &Pipette, racks: u32) {
        self.tips.insert(pipette.mount, TipTracker::new(pipette, racks));
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn step(&self, number: u32) -> StationResult<&ProtocolStep> {
        self.steps
            .get(&number)
            .ok_or(StationError::UnknownStep { step: number })
    }

    pub fn steps(&self) -> impl Iterator<Item = &ProtocolStep> {
        self.steps.values()
    }

    pub fn mark_completed(&mut self, number: u32, elapsed: Duration) -> StationResult<()> {
        let step = self
            .steps
            .get_mut(&number)
            .ok_or(StationError::UnknownStep { step: number })?;
        step.elapsed = Some(elapsed);
        Ok(())
    }

    pub fn tips_mut(&mut self, mount: Mount) -> StationResult<&mut TipTracker> {
        self.tips.get_mut(&mount).ok_or_else(|| {
            StationError::configuration(format!("no pipette registered on the {mount} mount"))
        })
    }

    pub fn tips(&self, mount: Mount) -> Option<&TipTracker> {
        self.tips.get(&mount)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Close the run
    pub fn into_summary(self, reagents: &[&Reagent]) -> RunSummary {
        let total_elapsed = self.started.elapsed();
        let tips_used = self
            .tips
            .values()
            .map(|t| (t.pipette().to_string(), t.total_used()))
            .collect();
        RunSummary {
            metadata: self.metadata,
            steps: self.steps.into_values().collect(),
            reagents: reagents.iter().map(|r| ReagentUsage::from(*r)).collect(),
            tips_used,
            total_elapsed,
            finished_at: Utc::now(),
        }
    }
}
