//! Handling presets for the extraction reagents
//!
//! Flow rates, rinse loops, height floors and deck positions used when a
//! scaled recipe is turned into live reagents.

use shared::ProtocolMode;

use crate::core::{
    LabwareLayout, MixOptions, ReagentCategory, ReagentKey, ReagentSpec, RecipeEntry,
    ReservoirGeometry, TransferOptions, Well,
};
use crate::station::TipPolicy;

/// Labware name of the shared 12-well reservoir
pub const RESERVOIR: &str = "reservoir_12";

/// Order reagents are laid out in the 12-well reservoir, left to right
const RESERVOIR_ORDER: [ReagentKey; 5] = [
    ReagentKey::Wone,
    ReagentKey::Wtwo,
    ReagentKey::Lysis,
    ReagentKey::Elution,
    ReagentKey::Beads,
];

/// Everything needed to dispense one reagent
#[derive(Debug, Clone)]
pub struct ReagentPreset {
    pub key: ReagentKey,
    pub template: ReagentSpec,
    pub geometry: ReservoirGeometry,
    pub options: TransferOptions,
    pub remix: Option<MixOptions>,
    pub tips: TipPolicy,
}

/// Where a reagent of `category` is held
pub fn geometry_for(category: ReagentCategory, mode: ProtocolMode) -> ReservoirGeometry {
    match category {
        ReagentCategory::BeadsViral | ReagentCategory::InternalControl => {
            ReservoirGeometry::tube_strip()
        }
        ReagentCategory::MasterMix => ReservoirGeometry::screwcap_2ml(),
        ReagentCategory::Standard | ReagentCategory::BeadsPathogen => match mode {
            ProtocolMode::Viral => ReservoirGeometry::generic_12_reservoir(),
            ProtocolMode::Pathogen => ReservoirGeometry::nest_12_reservoir(),
        },
    }
}

pub fn preset(mode: ProtocolMode, key: ReagentKey) -> ReagentPreset {
    let category = ReagentCategory::classify(mode, key);
    let geometry = geometry_for(category, mode);
    let base = TransferOptions::default().air_gap(10.0);

    let (template, options, remix, tips) = match key {
        ReagentKey::Wone => (
            ReagentSpec::new("Wash Buffer 1", 0.0, 0)
                .flow_rates(0.75, 1.0)
                .dispense_delay(3.0)
                .rinse(6)
                .height_policy(0.5, 50.0),
            base.rinse(true).dispense_height(-2.0).post_airgap(10.0),
            None,
            TipPolicy::Reuse,
        ),
        ReagentKey::Wtwo => (
            ReagentSpec::new("Wash Buffer 2", 0.0, 0)
                .flow_rates(0.75, 1.0)
                .dispense_delay(3.0)
                .rinse(2)
                .height_policy(0.5, 50.0),
            base.rinse(true).dispense_height(-2.0).post_airgap(10.0),
            None,
            TipPolicy::Reuse,
        ),
        ReagentKey::Lysis => (
            ReagentSpec::new("Lysis Buffer", 0.0, 0)
                .flow_rates(0.75, 0.5)
                .dispense_delay(2.0)
                .height_policy(0.5, 50.0),
            base.dispense_height(-2.0).blow_out(true).post_airgap(10.0),
            None,
            TipPolicy::Reuse,
        ),
        ReagentKey::Elution => (
            ReagentSpec::new("Elution Buffer", 0.0, 0)
                .flow_rates(1.0, 1.0)
                .height_policy(0.5, 50.0),
            base.dispense_height(-2.0).post_airgap(10.0),
            None,
            TipPolicy::Reuse,
        ),
        ReagentKey::Beads => {
            let (min_height, margin, mix_height) = match mode {
                ProtocolMode::Viral => (0.7, 0.0, 0.7),
                ProtocolMode::Pathogen => (0.3, 10.0, 1.0),
            };
            (
                ReagentSpec::new("Magnetic beads", 0.0, 0)
                    .flow_rates(0.5, 0.5)
                    .dispense_delay(3.0)
                    .rinse(6)
                    .height_policy(min_height, margin),
                base.rinse(true).dispense_height(-8.0).blow_out(true).post_airgap(10.0),
                Some(MixOptions::new(100.0, 10).heights(3.0, mix_height).blow_out(true)),
                TipPolicy::PerColumn,
            )
        }
        ReagentKey::Ic => (
            ReagentSpec::new("Internal control", 0.0, 0)
                .flow_rates(1.0, 3.0)
                .dispense_delay(2.0)
                .height_policy(0.5, 0.0),
            TransferOptions::default().dispense_height(-8.0).blow_out(true),
            None,
            TipPolicy::PerColumn,
        ),
        ReagentKey::Mmix => (
            ReagentSpec::new("Master mix", 0.0, 0)
                .flow_rates(1.0, 1.0)
                .height_policy(0.5, 5.0),
            TransferOptions::default().dispense_height(-1.0),
            None,
            TipPolicy::PerColumn,
        ),
    };

    ReagentPreset {
        key,
        template: template.geometry(&geometry),
        geometry,
        options,
        remix,
        tips,
    }
}

/// Whether `key` is held in the shared 12-well reservoir in `mode`
pub fn in_reservoir(mode: ProtocolMode, key: ReagentKey) -> bool {
    geometry_for(ReagentCategory::classify(mode, key), mode).channels_per_well > 1
}

/// Source wells a reagent occupies, in the order it uses them.
///
/// Reservoir reagents take consecutive columns in the order wash 1, wash 2,
/// lysis, elution, beads, each reserving as many columns as the layout
/// gives it. Everything else sits on its own tube strip or rack.
pub fn source_wells(mode: ProtocolMode, layout: &LabwareLayout, entry: &RecipeEntry) -> Vec<Well> {
    let count = entry.well_count as u32;
    if !in_reservoir(mode, entry.key) {
        let labware = format!("{}_tubes", entry.key.to_string().to_lowercase());
        return Well::row_a(&labware, 1, count);
    }

    let offset: usize = RESERVOIR_ORDER
        .iter()
        .take_while(|key| **key != entry.key)
        .filter(|key| in_reservoir(mode, **key))
        .filter_map(|key| layout.wells_for(*key))
        .sum();
    Well::row_a(RESERVOIR, offset as u32 + 1, count)
}
