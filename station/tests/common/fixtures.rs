//! Test fixtures and data for station tests

use shared::{ProtocolMode, RunMetadata, StationId};
use station::core::{Mount, Pipette, ReagentSpec, ReservoirGeometry, Well};
use station::{ProtocolStep, Reagent};

/// Standard test data and fixtures
pub struct TestFixtures;

#[allow(dead_code)]
impl TestFixtures {
    /// Three-well reservoir used by the exhaustion scenario
    pub const WELLS: usize = 3;
    pub const VOLUME_PER_WELL: f64 = 1000.0;
    pub const DEAD_VOLUME: f64 = 50.0;
    pub const DRAW: f64 = 100.0;
    pub const MARGIN: f64 = 50.0;
    pub const AREA: f64 = 10.0;

    pub const PIPETTE_CAPACITY: f64 = 180.0;
    pub const TECHNICIAN: &'static str = "tester";

    /// Reagent spread over three 1000 ul wells with a 50 ul cone
    pub fn three_well_reagent() -> Reagent {
        let spec = ReagentSpec {
            conical_dead_volume: Self::DEAD_VOLUME,
            ..ReagentSpec::new("Lysis Buffer", Self::VOLUME_PER_WELL * Self::WELLS as f64, Self::WELLS)
                .height_policy(0.5, Self::MARGIN)
        };
        Reagent::new(spec).unwrap()
    }

    /// Trough reagent with enough volume for a full plate at `per_column`
    pub fn trough_reagent(name: &str, total: f64, wells: usize) -> Reagent {
        let spec = ReagentSpec::new(name, total, wells)
            .geometry(&ReservoirGeometry::nest_12_reservoir())
            .height_policy(0.5, 50.0);
        Reagent::new(spec).unwrap()
    }

    pub fn multichannel() -> Pipette {
        Pipette::multichannel("p300_multi", Mount::Right, Self::PIPETTE_CAPACITY)
    }

    pub fn reservoir_wells(count: u32) -> Vec<Well> {
        Well::row_a("reservoir_12", 1, count)
    }

    pub fn plate_columns(count: u32) -> Vec<Well> {
        Well::row_a("deepwell_plate", 1, count)
    }

    pub fn metadata() -> RunMetadata {
        RunMetadata::new(StationId::Extraction, ProtocolMode::Pathogen, 94, Self::TECHNICIAN)
    }

    /// Two enabled steps and one disabled one
    pub fn steps() -> Vec<ProtocolStep> {
        vec![
            ProtocolStep::new(1, "Add 260 ul Lysis Buffer"),
            ProtocolStep::new(2, "Incubate").wait(300),
            ProtocolStep::new(3, "Add 90 ul Elution Buffer").skip(),
        ]
    }
}
