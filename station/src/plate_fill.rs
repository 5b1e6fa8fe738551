//! Reagent dispensing run for the extraction plate
//!
//! Scales the recipe, places every bulk reagent on the deck and fills one
//! deep-well column per eight samples, one protocol step per reagent.

use shared::{column_count, ProtocolMode, StationId};

use crate::core::{
    compute_recipe, split_transfer, LabwareLayout, Pipette, Reagent, ReagentKey, Recipe,
    RecipeTable, Well,
};
use crate::error::{StationError, StationResult};
use crate::presets::{preset, source_wells};
use crate::state::ProtocolStep;
use crate::station::{FillPlan, Station};
use crate::traits::{Actuator, Operator, RunLogSink};

/// Labware name of the deep-well plate being filled
pub const SAMPLE_PLATE: &str = "deepwell_plate";

/// Dispense order over a run
pub const FILL_ORDER: [ReagentKey; 5] = [
    ReagentKey::Lysis,
    ReagentKey::Beads,
    ReagentKey::Wone,
    ReagentKey::Wtwo,
    ReagentKey::Elution,
];

/// One reagent ready to be dispensed
#[derive(Debug, Clone)]
pub struct ReagentFill {
    pub key: ReagentKey,
    pub step: u32,
    pub reagent: Reagent,
    pub plan: FillPlan,
}

impl ReagentFill {
    /// Replay every draw of this fill on a copy of the reagent so an
    /// under-provisioned reservoir is reported before any liquid moves
    pub fn check_coverage(&self, pipette: &Pipette) -> StationResult<()> {
        let plan = &self.plan;
        let pieces = split_transfer(plan.volume, plan.options.air_gap, pipette.capacity)?;
        let needed = pieces.len() * plan.dests.len();
        let mut reagent = self.reagent.clone();

        for covered in 0..needed {
            let piece = pieces[covered % pieces.len()];
            let drawn = plan.geometry.draw_per_well(pipette.channels, piece);
            match reagent.next_pickup(plan.geometry.cross_section_area, drawn) {
                Ok(_) => {}
                Err(StationError::ReservoirExhausted { well_count, .. }) => {
                    return Err(StationError::configuration(format!(
                        "{} in {} well(s) covers {covered} of {needed} draws for {} columns",
                        self.reagent.name(),
                        well_count,
                        plan.dests.len()
                    )));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Scaled recipe plus the dispensing work derived from it
#[derive(Debug, Clone)]
pub struct PlateFill {
    pub recipe: Recipe,
    pub fills: Vec<ReagentFill>,
}

impl PlateFill {
    /// Scale the recipe and lay out one fill per reagent for `pipette`.
    /// Fails with a configuration error when a reservoir cannot cover
    /// every column it is asked to fill.
    pub fn plan(
        mode: ProtocolMode,
        num_samples: u32,
        table: &RecipeTable,
        layout: &LabwareLayout,
        pipette: &Pipette,
    ) -> StationResult<Self> {
        let corrected = shared::correct_sample_count(num_samples);
        let recipe = compute_recipe(mode, corrected, num_samples, table, layout)?;
        let dests = Well::row_a(SAMPLE_PLATE, 1, column_count(num_samples));

        let mut fills = Vec::with_capacity(FILL_ORDER.len());
        for (i, key) in FILL_ORDER.iter().enumerate() {
            let (Some(entry), Some(row)) = (recipe.get(key), table.row(mode, *key)) else {
                return Err(StationError::configuration(format!(
                    "no recipe entry for {key} in {mode} mode"
                )));
            };

            let preset = preset(mode, *key);
            let reagent = Reagent::from_recipe(entry, preset.template.clone())?;
            let plan = FillPlan {
                geometry: preset.geometry,
                sources: source_wells(mode, layout, entry),
                dests: dests.clone(),
                volume: row.volume_per_sample,
                options: preset.options,
                remix: preset.remix,
                tips: preset.tips,
            };
            let fill = ReagentFill {
                key: *key,
                step: i as u32 + 1,
                reagent,
                plan,
            };
            fill.check_coverage(pipette)?;
            fills.push(fill);
        }

        Ok(Self { recipe, fills })
    }

    /// Step table matching the fills, `Add 100 ul Lysis Buffer` and so on
    pub fn steps(&self) -> Vec<ProtocolStep> {
        self.fills
            .iter()
            .map(|fill| {
                ProtocolStep::new(
                    fill.step,
                    format!("Add {} ul {}", fill.plan.volume, fill.reagent.name()),
                )
            })
            .collect()
    }

    /// Dispense every reagent into the plate
    pub fn run<A, L, O>(&mut self, station: &mut Station<A, L, O>, pipette: &Pipette) -> StationResult<()>
    where
        A: Actuator,
        L: RunLogSink,
        O: Operator,
    {
        for fill in &mut self.fills {
            let ReagentFill {
                step, reagent, plan, ..
            } = fill;
            station.run_step(*step, |s| s.fill_columns(pipette, reagent, plan))?;
        }
        shared::station_info!(StationId::current(), "Plate filled");
        Ok(())
    }

    pub fn reagents(&self) -> Vec<&Reagent> {
        self.fills.iter().map(|fill| &fill.reagent).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Mount;
    use assert_matches::assert_matches;

    fn p300() -> Pipette {
        Pipette::multichannel("p300_multi", Mount::Right, 180.0)
    }

    fn plan(mode: ProtocolMode, samples: u32) -> StationResult<PlateFill> {
        PlateFill::plan(
            mode,
            samples,
            &RecipeTable::builtin(),
            &LabwareLayout::for_mode(mode),
            &p300(),
        )
    }

    #[test]
    fn test_plan_builds_one_step_per_reagent() {
        let plan = plan(ProtocolMode::Pathogen, 94).unwrap();

        let steps = plan.steps();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].description, "Add 260 ul Lysis Buffer");
        assert_eq!(plan.fills[3].plan.sources.len(), 4);
        assert_eq!(plan.fills[0].plan.dests.len(), 12);
    }

    #[test]
    fn test_partial_plate_uses_fewer_columns() {
        let plan = plan(ProtocolMode::Viral, 20).unwrap();
        assert!(plan.fills.iter().all(|f| f.plan.dests.len() == 3));
    }

    #[test]
    fn test_underprovisioned_wash_rejected_at_plan_time() {
        // 40 samples: two 9600 ul wells, 1200 ul per draw with a 50 ul
        // margin leaves 7 draws per well for the 15 needed
        let result = plan(ProtocolMode::Pathogen, 40);
        assert_matches!(
            result,
            Err(StationError::Configuration { reason }) if reason.contains("Wash Buffer 2") && reason.contains("14 of 15")
        );
    }

    #[test]
    fn test_coverage_replay_leaves_reagent_untouched() {
        let plan = plan(ProtocolMode::Pathogen, 94).unwrap();
        for fill in &plan.fills {
            fill.check_coverage(&p300()).unwrap();
            assert_eq!(fill.reagent.current_well_index(), 0);
            assert!(fill.reagent.abandoned_volumes().is_empty());
        }
    }
}
