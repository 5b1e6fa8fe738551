//! Reservoir volume tracking and pickup-height estimation
//!
//! A `Reagent` follows the liquid left in the well it is currently drawing
//! from. Every draw goes through [`Reagent::pickup_height`], which decides
//! whether the current well still holds enough liquid, switches to the next
//! well when it does not, and returns the height the tip should aspirate at.
//! The model is predictive: it is only updated by height requests, never by
//! the actuator.

use serde::{Deserialize, Serialize};
use shared::Microliters;
use tracing::debug;

use crate::core::labware::ReservoirGeometry;
use crate::core::recipe::RecipeEntry;
use crate::error::{StationError, StationResult};

/// Floor and safety margin used when computing pickup heights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightPolicy {
    /// Lowest height (mm above the bottom) the tip is ever sent to
    pub min_height: f64,
    /// Volume that must remain after a draw for the well to stay in use
    pub extra_volume_margin: Microliters,
}

impl Default for HeightPolicy {
    fn default() -> Self {
        Self {
            min_height: 0.5,
            extra_volume_margin: 50.0,
        }
    }
}

/// Result of a height request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupHeight {
    pub height: f64,
    pub well_changed: bool,
}

/// Everything needed to create a reagent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentSpec {
    pub name: String,
    pub total_volume: Microliters,
    pub well_count: usize,
    pub flow_rate_aspirate: f64,
    pub flow_rate_dispense: f64,
    pub flow_rate_aspirate_mix: f64,
    pub flow_rate_dispense_mix: f64,
    pub dispense_delay_seconds: f64,
    pub rinse: bool,
    pub rinse_loops: u32,
    pub conical_dead_volume: Microliters,
    pub conical_height: f64,
    pub height_policy: HeightPolicy,
}

impl ReagentSpec {
    pub fn new(name: impl Into<String>, total_volume: Microliters, well_count: usize) -> Self {
        Self {
            name: name.into(),
            total_volume,
            well_count,
            flow_rate_aspirate: 1.0,
            flow_rate_dispense: 1.0,
            flow_rate_aspirate_mix: 4.0,
            flow_rate_dispense_mix: 4.0,
            dispense_delay_seconds: 0.0,
            rinse: false,
            rinse_loops: 2,
            conical_dead_volume: 0.0,
            conical_height: 0.0,
            height_policy: HeightPolicy::default(),
        }
    }

    pub fn flow_rates(mut self, aspirate: f64, dispense: f64) -> Self {
        self.flow_rate_aspirate = aspirate;
        self.flow_rate_dispense = dispense;
        self
    }

    pub fn mix_rates(mut self, aspirate: f64, dispense: f64) -> Self {
        self.flow_rate_aspirate_mix = aspirate;
        self.flow_rate_dispense_mix = dispense;
        self
    }

    pub fn dispense_delay(mut self, seconds: f64) -> Self {
        self.dispense_delay_seconds = seconds;
        self
    }

    pub fn rinse(mut self, loops: u32) -> Self {
        self.rinse = true;
        self.rinse_loops = loops;
        self
    }

    pub fn geometry(mut self, geometry: &ReservoirGeometry) -> Self {
        self.conical_dead_volume = geometry.dead_volume;
        self.conical_height = geometry.conical_height;
        self
    }

    pub fn height_policy(mut self, min_height: f64, extra_volume_margin: Microliters) -> Self {
        self.height_policy = HeightPolicy {
            min_height,
            extra_volume_margin,
        };
        self
    }
}

/// Live state of one reagent during a run
#[derive(Debug, Clone, Serialize)]
pub struct Reagent {
    spec: ReagentSpec,
    volume_per_well_original: Microliters,
    current_well_volume: Microliters,
    current_well_index: usize,
    abandoned_volumes: Vec<Microliters>,
}

impl Reagent {
    pub fn new(spec: ReagentSpec) -> StationResult<Self> {
        if spec.well_count == 0 {
            return Err(StationError::configuration(format!(
                "reagent {} must occupy at least one well",
                spec.name
            )));
        }
        if spec.total_volume.is_nan() || spec.total_volume <= 0.0 {
            return Err(StationError::configuration(format!(
                "reagent {} has no volume ({} ul)",
                spec.name, spec.total_volume
            )));
        }

        let per_well = spec.total_volume / spec.well_count as f64;
        if spec.conical_dead_volume >= per_well {
            return Err(StationError::configuration(format!(
                "reagent {}: dead volume {} ul is not below the {} ul per well",
                spec.name, spec.conical_dead_volume, per_well
            )));
        }

        Ok(Self {
            spec,
            volume_per_well_original: per_well,
            current_well_volume: per_well,
            current_well_index: 0,
            abandoned_volumes: Vec::new(),
        })
    }

    /// Build a reagent from a scaled recipe entry, taking handling
    /// parameters from `template`
    pub fn from_recipe(entry: &RecipeEntry, template: ReagentSpec) -> StationResult<Self> {
        let spec = ReagentSpec {
            total_volume: entry.total_volume(),
            well_count: entry.well_count,
            ..template
        };
        Self::new(spec)
    }

    /// Height to aspirate `aspirate_volume` at, switching wells first when
    /// the current one would drop below `aspirate_volume + extra_volume_margin`.
    ///
    /// Switching past the last well fails with `ReservoirExhausted` and
    /// leaves the state unchanged.
    pub fn pickup_height(
        &mut self,
        cross_section_area: f64,
        aspirate_volume: Microliters,
        min_height: f64,
        extra_volume_margin: Microliters,
    ) -> StationResult<PickupHeight> {
        let needed = aspirate_volume + extra_volume_margin;
        debug!(
            reagent = %self.spec.name,
            remaining = self.current_well_volume,
            needed,
            "Pickup height requested"
        );

        let well_changed = self.current_well_volume < needed;
        if well_changed {
            let next_index = self.current_well_index + 1;
            if next_index >= self.spec.well_count {
                return Err(StationError::ReservoirExhausted {
                    reagent: self.spec.name.clone(),
                    well_index: self.current_well_index,
                    well_count: self.spec.well_count,
                });
            }
            debug!(
                reagent = %self.spec.name,
                from = self.current_well_index,
                to = next_index,
                abandoned = self.current_well_volume,
                "Switching reservoir well"
            );
            self.abandoned_volumes.push(self.current_well_volume);
            self.current_well_index = next_index;
            self.current_well_volume = self.volume_per_well_original;
        }

        let computed = (self.current_well_volume - aspirate_volume - self.spec.conical_dead_volume)
            / cross_section_area;
        self.current_well_volume -= aspirate_volume;
        let height = computed.max(min_height);

        debug!(
            reagent = %self.spec.name,
            computed,
            height,
            well = self.current_well_index,
            "Pickup height resolved"
        );

        Ok(PickupHeight {
            height,
            well_changed,
        })
    }

    /// `pickup_height` with this reagent's own height policy
    pub fn next_pickup(
        &mut self,
        cross_section_area: f64,
        aspirate_volume: Microliters,
    ) -> StationResult<PickupHeight> {
        let policy = self.spec.height_policy;
        self.pickup_height(
            cross_section_area,
            aspirate_volume,
            policy.min_height,
            policy.extra_volume_margin,
        )
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ReagentSpec {
        &self.spec
    }

    pub fn well_count(&self) -> usize {
        self.spec.well_count
    }

    pub fn volume_per_well_original(&self) -> Microliters {
        self.volume_per_well_original
    }

    pub fn current_well_volume(&self) -> Microliters {
        self.current_well_volume
    }

    pub fn current_well_index(&self) -> usize {
        self.current_well_index
    }

    pub fn abandoned_volumes(&self) -> &[Microliters] {
        &self.abandoned_volumes
    }

    pub fn total_abandoned(&self) -> Microliters {
        self.abandoned_volumes.iter().sum()
    }

    /// Liquid left in the current well plus the untouched wells after it
    pub fn remaining_total(&self) -> Microliters {
        let untouched = self.spec.well_count - self.current_well_index - 1;
        self.current_well_volume + untouched as f64 * self.volume_per_well_original
    }
}
