//! Recipe scaling: sample count to per-reagent well counts and fill volumes
//!
//! Each reagent key is classified into a [`ReagentCategory`] once, when the
//! recipe table is built. The category carries the packing rule, so
//! scaling is a single dispatch per entry.

use serde::{Deserialize, Serialize};
use shared::{Microliters, ProtocolMode, CHANNEL_WIDTH};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{StationError, StationResult};

/// Reagents prepared for an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReagentKey {
    Beads,
    Wone,
    Wtwo,
    #[serde(rename = "IC")]
    Ic,
    Elution,
    Lysis,
    #[serde(rename = "MMIX")]
    Mmix,
}

impl ReagentKey {
    pub const ALL: [ReagentKey; 7] = [
        ReagentKey::Beads,
        ReagentKey::Wone,
        ReagentKey::Wtwo,
        ReagentKey::Ic,
        ReagentKey::Elution,
        ReagentKey::Lysis,
        ReagentKey::Mmix,
    ];

    /// Reagents dispensed from the 12-well reservoir with the multichannel
    pub fn is_bulk(&self) -> bool {
        !matches!(self, ReagentKey::Ic | ReagentKey::Mmix)
    }
}

impl fmt::Display for ReagentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReagentKey::Beads => "Beads",
            ReagentKey::Wone => "Wone",
            ReagentKey::Wtwo => "Wtwo",
            ReagentKey::Ic => "IC",
            ReagentKey::Elution => "Elution",
            ReagentKey::Lysis => "Lysis",
            ReagentKey::Mmix => "MMIX",
        };
        write!(f, "{label}")
    }
}

/// Packing policy of a reagent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReagentCategory {
    /// Wash buffers, lysis, elution: 100 ul granularity, capacity-derived wells
    Standard,
    /// Sample headcount plus controls, single well
    MasterMix,
    /// 5 ul granularity per channel, single well
    InternalControl,
    /// Two wells, 10 ul granularity per channel
    BeadsViral,
    /// Standard rule
    BeadsPathogen,
}

impl ReagentCategory {
    pub fn classify(mode: ProtocolMode, key: ReagentKey) -> Self {
        match (key, mode) {
            (ReagentKey::Mmix, _) => ReagentCategory::MasterMix,
            (ReagentKey::Ic, _) => ReagentCategory::InternalControl,
            (ReagentKey::Beads, ProtocolMode::Viral) => ReagentCategory::BeadsViral,
            (ReagentKey::Beads, ProtocolMode::Pathogen) => ReagentCategory::BeadsPathogen,
            _ => ReagentCategory::Standard,
        }
    }

    /// `(volume_per_well, well_count)` for one reagent
    pub fn scale(
        &self,
        row: &RecipeRow,
        corrected_count: u32,
        raw_count: u32,
        max_well_capacity: Microliters,
    ) -> (Microliters, usize) {
        let per_sample = row.volume_per_sample;
        let dead = row.dead_volume;
        let channels = CHANNEL_WIDTH as f64;

        match self {
            ReagentCategory::Standard | ReagentCategory::BeadsPathogen => {
                let needed = per_sample * corrected_count as f64;
                let total = round_up(needed, 100.0);
                let wells = (needed / max_well_capacity).ceil();
                let per_well = round_up(total / wells + dead, 100.0);
                (per_well, wells as usize)
            }
            ReagentCategory::MasterMix => {
                // samples + 2 controls + 3 units of headroom
                let headcount = raw_count as f64 + 2.0 + 3.0;
                (per_sample * headcount + dead, 1)
            }
            ReagentCategory::InternalControl => {
                let total = round_up(per_sample * corrected_count as f64, 5.0);
                let per_well = round_up((total + dead) / channels, 5.0);
                (per_well, 1)
            }
            ReagentCategory::BeadsViral => {
                let wells = 2.0;
                let total = round_up(per_sample * corrected_count as f64, 10.0);
                let per_well = round_up((total / wells + dead) / channels, 10.0);
                (per_well, wells as usize)
            }
        }
    }
}

fn round_up(value: f64, step: f64) -> f64 {
    (value / step).ceil() * step
}

/// Per-sample objective and dead-volume allowance of one reagent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeRow {
    pub category: ReagentCategory,
    pub volume_per_sample: Microliters,
    pub dead_volume: Microliters,
}

/// Output of the scaler for one reagent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub key: ReagentKey,
    pub volume_per_well: Microliters,
    pub well_count: usize,
}

impl RecipeEntry {
    pub fn total_volume(&self) -> Microliters {
        self.volume_per_well * self.well_count as f64
    }
}

pub type Recipe = BTreeMap<ReagentKey, RecipeEntry>;

/// `table[mode][key] -> (volume per sample, dead volume)`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeTable {
    rows: BTreeMap<ProtocolMode, BTreeMap<ReagentKey, RecipeRow>>,
}

impl RecipeTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in volumes for viral and pathogen extraction
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        let viral = [
            (ReagentKey::Beads, 20.0, 800.0),
            (ReagentKey::Wone, 100.0, 600.0),
            (ReagentKey::Wtwo, 100.0, 600.0),
            (ReagentKey::Ic, 10.0, 1500.0),
            (ReagentKey::Elution, 50.0, 900.0),
            (ReagentKey::Lysis, 100.0, 600.0),
            (ReagentKey::Mmix, 20.0, 30.0),
        ];
        let pathogen = [
            (ReagentKey::Beads, 260.0, 600.0),
            (ReagentKey::Wone, 300.0, 600.0),
            (ReagentKey::Wtwo, 450.0, 600.0),
            (ReagentKey::Ic, 10.0, 1500.0),
            (ReagentKey::Elution, 90.0, 600.0),
            (ReagentKey::Lysis, 260.0, 600.0),
            (ReagentKey::Mmix, 20.0, 30.0),
        ];
        for (key, per_sample, dead) in viral {
            table.insert(ProtocolMode::Viral, key, per_sample, dead);
        }
        for (key, per_sample, dead) in pathogen {
            table.insert(ProtocolMode::Pathogen, key, per_sample, dead);
        }
        table
    }

    pub fn insert(
        &mut self,
        mode: ProtocolMode,
        key: ReagentKey,
        volume_per_sample: Microliters,
        dead_volume: Microliters,
    ) {
        let row = RecipeRow {
            category: ReagentCategory::classify(mode, key),
            volume_per_sample,
            dead_volume,
        };
        self.rows.entry(mode).or_default().insert(key, row);
    }

    /// Use the per-sample volume of a master-mix preset for MMIX in every mode
    pub fn with_master_mix(mut self, kind: MasterMixKind) -> Self {
        for rows in self.rows.values_mut() {
            if let Some(row) = rows.get_mut(&ReagentKey::Mmix) {
                row.volume_per_sample = kind.volume_per_sample();
            }
        }
        self
    }

    pub fn rows(&self, mode: ProtocolMode) -> Option<&BTreeMap<ReagentKey, RecipeRow>> {
        self.rows.get(&mode)
    }

    pub fn row(&self, mode: ProtocolMode, key: ReagentKey) -> Option<&RecipeRow> {
        self.rows.get(&mode).and_then(|rows| rows.get(&key))
    }
}

/// Physical wells available to each reagent on the deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabwareLayout {
    pub max_well_capacity: Microliters,
    pub wells: BTreeMap<ReagentKey, usize>,
}

impl LabwareLayout {
    pub fn new(max_well_capacity: Microliters) -> Self {
        Self {
            max_well_capacity,
            wells: BTreeMap::new(),
        }
    }

    pub fn with_wells(mut self, key: ReagentKey, wells: usize) -> Self {
        self.wells.insert(key, wells);
        self
    }

    /// Reservoir partition used by each extraction mode
    pub fn for_mode(mode: ProtocolMode) -> Self {
        match mode {
            ProtocolMode::Viral => Self::new(12_400.0)
                .with_wells(ReagentKey::Wone, 3)
                .with_wells(ReagentKey::Wtwo, 3)
                .with_wells(ReagentKey::Lysis, 2)
                .with_wells(ReagentKey::Elution, 1)
                .with_wells(ReagentKey::Beads, 2)
                .with_wells(ReagentKey::Ic, 1)
                .with_wells(ReagentKey::Mmix, 1),
            ProtocolMode::Pathogen => Self::new(13_500.0)
                .with_wells(ReagentKey::Wone, 3)
                .with_wells(ReagentKey::Wtwo, 4)
                .with_wells(ReagentKey::Lysis, 2)
                .with_wells(ReagentKey::Elution, 1)
                .with_wells(ReagentKey::Beads, 2)
                .with_wells(ReagentKey::Ic, 1)
                .with_wells(ReagentKey::Mmix, 1),
        }
    }

    pub fn wells_for(&self, key: ReagentKey) -> Option<usize> {
        self.wells.get(&key).copied()
    }
}

/// Scale every reagent of `mode` for a run.
///
/// `corrected_count` must already be rounded up to whole columns; the master
/// mix is sized from `raw_count`.
pub fn compute_recipe(
    mode: ProtocolMode,
    corrected_count: u32,
    raw_count: u32,
    table: &RecipeTable,
    layout: &LabwareLayout,
) -> StationResult<Recipe> {
    if raw_count == 0 {
        return Err(StationError::invalid_input("sample count must be positive"));
    }
    if corrected_count % CHANNEL_WIDTH != 0 || corrected_count < raw_count {
        return Err(StationError::invalid_input(format!(
            "corrected count {corrected_count} is not {raw_count} rounded up to a multiple of {CHANNEL_WIDTH}"
        )));
    }
    if layout.max_well_capacity <= 0.0 {
        return Err(StationError::configuration("max well capacity must be positive"));
    }

    let rows = table
        .rows(mode)
        .ok_or_else(|| StationError::configuration(format!("no recipe rows for {mode} mode")))?;

    let mut recipe = Recipe::new();
    for (key, row) in rows {
        let (volume_per_well, well_count) =
            row.category
                .scale(row, corrected_count, raw_count, layout.max_well_capacity);

        let available = layout.wells_for(*key).ok_or_else(|| {
            StationError::configuration(format!("labware layout has no position for {key}"))
        })?;
        if well_count > available {
            return Err(StationError::configuration(format!(
                "{key} needs {well_count} wells but the layout provides {available}"
            )));
        }

        recipe.insert(
            *key,
            RecipeEntry {
                key: *key,
                volume_per_well,
                well_count,
            },
        );
    }
    Ok(recipe)
}

/// Commercial master-mix kits and their per-sample composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasterMixKind {
    Seegene,
    Universal,
    UniversalIdt,
    Clinic,
    Multiplex,
}

/// One ingredient of a master mix and its volume per sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixComponent {
    pub name: &'static str,
    pub volume_per_sample: Microliters,
}

const fn component(name: &'static str, volume_per_sample: Microliters) -> MixComponent {
    MixComponent {
        name,
        volume_per_sample,
    }
}

impl MasterMixKind {
    pub fn volume_per_sample(&self) -> Microliters {
        match self {
            MasterMixKind::Seegene => 17.0,
            MasterMixKind::Universal | MasterMixKind::UniversalIdt | MasterMixKind::Multiplex => 20.0,
            MasterMixKind::Clinic => 40.0,
        }
    }

    pub fn components(&self) -> &'static [MixComponent] {
        static SEEGENE: [MixComponent; 4] = [
            component("MMIX", 5.0),
            component("Primer/probe", 5.0),
            component("RNase-free water", 5.0),
            component("Enzyme", 2.0),
        ];
        static UNIVERSAL: [MixComponent; 7] = [
            component("Taq buffer", 8.0),
            component("Water", 5.0),
            component("Target 1", 1.0),
            component("Target 2", 2.0),
            component("Target 3", 2.0),
            component("Target 4", 1.0),
            component("Target 5", 1.0),
        ];
        static UNIVERSAL_IDT: [MixComponent; 5] = [
            component("Taq buffer", 12.0),
            component("Water", 5.0),
            component("Target 1", 1.0),
            component("Target 2", 1.0),
            component("Target 3", 1.0),
        ];
        static CLINIC: [MixComponent; 1] = [component("Ready mix", 1.0)];
        static MULTIPLEX: [MixComponent; 3] = [
            component("Primer mix", 6.25),
            component("Enzyme", 1.25),
            component("Water", 12.5),
        ];

        match self {
            MasterMixKind::Seegene => &SEEGENE,
            MasterMixKind::Universal => &UNIVERSAL,
            MasterMixKind::UniversalIdt => &UNIVERSAL_IDT,
            MasterMixKind::Clinic => &CLINIC,
            MasterMixKind::Multiplex => &MULTIPLEX,
        }
    }

    /// Volume of each component needed to make `mmix_volume_per_well`
    pub fn component_volumes(&self, mmix_volume_per_well: Microliters) -> Vec<(&'static str, Microliters)> {
        let mix_per_sample = self.volume_per_sample();
        self.components()
            .iter()
            .map(|c| {
                let concentration = mix_per_sample / c.volume_per_sample;
                (c.name, mmix_volume_per_well / concentration)
            })
            .collect()
    }
}

impl std::str::FromStr for MasterMixKind {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "seegene" => Ok(MasterMixKind::Seegene),
            "universal" => Ok(MasterMixKind::Universal),
            "universal_idt" => Ok(MasterMixKind::UniversalIdt),
            "clinic" => Ok(MasterMixKind::Clinic),
            "multiplex" => Ok(MasterMixKind::Multiplex),
            _ => Err(StationError::invalid_input(format!("unknown master mix: {s}"))),
        }
    }
}
