//! Transfer sequencing over actuator primitives
//!
//! The planner owns no run state. It borrows the actuator and the pipette
//! for the duration of a sequence, turns transfer requests into primitive
//! calls, and asks a [`Reagent`] for pickup heights when drawing from a
//! tracked reservoir.

use serde::{Deserialize, Serialize};
use shared::Microliters;
use tracing::debug;

use crate::core::labware::{ReservoirGeometry, Well};
use crate::core::reservoir::Reagent;
use crate::core::tips::Pipette;
use crate::core::volume::divide_volume;
use crate::error::{StationError, StationResult};
use crate::traits::{Actuator, TouchTip};

/// Volume dispensed above the destination after the main dispense
pub const DEFAULT_POST_DISPENSE: Microliters = 20.0;
/// Air pulled back into the tip after leaving the destination
pub const DEFAULT_POST_AIRGAP: Microliters = 10.0;
/// Air gap used between dispenses of a multi-dispense
pub const DISTRIBUTE_AIR_GAP: Microliters = 10.0;

const VOLUME_TOLERANCE: Microliters = 1e-6;

/// Per-call switches for a single transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOptions {
    pub air_gap: Microliters,
    /// Lateral offset at the source, mm
    pub source_x_offset: f64,
    /// Lateral offset at the destination, mm
    pub dest_x_offset: f64,
    /// Aspirate height above the source bottom, mm
    pub pickup_height: f64,
    pub rinse: bool,
    /// Dispense height relative to the destination top, mm
    pub dispense_height: f64,
    pub blow_out: bool,
    pub touch_tip: bool,
    pub post_dispense: Option<Microliters>,
    pub post_airgap: Option<Microliters>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            air_gap: 0.0,
            source_x_offset: 0.0,
            dest_x_offset: 0.0,
            pickup_height: 1.0,
            rinse: false,
            dispense_height: -2.0,
            blow_out: false,
            touch_tip: false,
            post_dispense: None,
            post_airgap: None,
        }
    }
}

impl TransferOptions {
    pub fn air_gap(mut self, volume: Microliters) -> Self {
        self.air_gap = volume;
        self
    }

    pub fn x_offsets(mut self, source: f64, dest: f64) -> Self {
        self.source_x_offset = source;
        self.dest_x_offset = dest;
        self
    }

    pub fn pickup_height(mut self, height: f64) -> Self {
        self.pickup_height = height;
        self
    }

    pub fn rinse(mut self, rinse: bool) -> Self {
        self.rinse = rinse;
        self
    }

    pub fn dispense_height(mut self, height: f64) -> Self {
        self.dispense_height = height;
        self
    }

    pub fn blow_out(mut self, blow_out: bool) -> Self {
        self.blow_out = blow_out;
        self
    }

    pub fn touch_tip(mut self, touch_tip: bool) -> Self {
        self.touch_tip = touch_tip;
        self
    }

    pub fn post_dispense(mut self, volume: Microliters) -> Self {
        self.post_dispense = Some(volume);
        self
    }

    pub fn post_airgap(mut self, volume: Microliters) -> Self {
        self.post_airgap = Some(volume);
        self
    }
}

/// In-place mixing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixOptions {
    pub volume: Microliters,
    pub rounds: u32,
    /// Dispense height above the bottom; 0 means the 3 mm default
    pub mix_height: f64,
    /// Aspirate height above the bottom
    pub source_height: f64,
    pub source_x_offset: f64,
    pub dest_x_offset: f64,
    pub blow_out: bool,
    pub post_dispense: Option<Microliters>,
    pub post_airgap: Option<Microliters>,
}

impl MixOptions {
    pub fn new(volume: Microliters, rounds: u32) -> Self {
        Self {
            volume,
            rounds,
            mix_height: 0.0,
            source_height: 3.0,
            source_x_offset: 0.0,
            dest_x_offset: 0.0,
            blow_out: false,
            post_dispense: None,
            post_airgap: None,
        }
    }

    pub fn blow_out(mut self, blow_out: bool) -> Self {
        self.blow_out = blow_out;
        self
    }

    pub fn heights(mut self, source_height: f64, mix_height: f64) -> Self {
        self.source_height = source_height;
        self.mix_height = mix_height;
        self
    }

    pub fn x_offsets(mut self, source: f64, dest: f64) -> Self {
        self.source_x_offset = source;
        self.dest_x_offset = dest;
        self
    }

    fn effective_mix_height(&self) -> f64 {
        if self.mix_height == 0.0 {
            3.0
        } else {
            self.mix_height
        }
    }
}

/// Sub-volumes needed to move `volume` through a tip of `capacity` with
/// `air_gap` riding along each piece
pub fn split_transfer(
    volume: Microliters,
    air_gap: Microliters,
    capacity: Microliters,
) -> StationResult<Vec<Microliters>> {
    if volume <= 0.0 {
        return Err(StationError::invalid_input(format!(
            "transfer volume must be positive, got {volume}"
        )));
    }
    if air_gap >= capacity {
        return Err(StationError::TransferVolumeOverflow {
            volume: air_gap,
            capacity,
        });
    }
    if volume + air_gap > capacity {
        Ok(divide_volume(volume, capacity - air_gap))
    } else {
        Ok(vec![volume])
    }
}

/// Sequencer for one pipette
pub struct TransferPlanner<'a, A: Actuator> {
    actuator: &'a mut A,
    pipette: &'a Pipette,
}

impl<'a, A: Actuator> TransferPlanner<'a, A> {
    pub fn new(actuator: &'a mut A, pipette: &'a Pipette) -> Self {
        Self { actuator, pipette }
    }

    /// Sub-volumes needed to move `volume` with `air_gap` riding along
    pub fn split(&self, volume: Microliters, air_gap: Microliters) -> StationResult<Vec<Microliters>> {
        split_transfer(volume, air_gap, self.pipette.capacity)
    }

    /// Move `volume` from `source` to `dest`, splitting it when it does not
    /// fit the tip together with the air gap. Rinse applies to the first
    /// sub-transfer only. Returns the number of sub-transfers issued.
    pub fn transfer(
        &mut self,
        reagent: &Reagent,
        source: &Well,
        dest: &Well,
        volume: Microliters,
        options: &TransferOptions,
    ) -> StationResult<usize> {
        let pieces = self.split(volume, options.air_gap)?;
        let count = pieces.len();
        for (i, piece) in pieces.into_iter().enumerate() {
            let rinse = options.rinse && i == 0;
            self.move_once(reagent, source, dest, piece, options, rinse)?;
        }
        Ok(count)
    }

    /// Transfer from a tracked reservoir: every sub-transfer asks `reagent`
    /// for its pickup height (for every channel sharing the well) and draws from the
    /// well the reagent is currently on. When the reagent moves to a new
    /// well, that well is mixed first with `remix`.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_from_reservoir(
        &mut self,
        reagent: &mut Reagent,
        geometry: &ReservoirGeometry,
        sources: &[Well],
        dest: &Well,
        volume: Microliters,
        options: &TransferOptions,
        remix: Option<&MixOptions>,
    ) -> StationResult<usize> {
        let pieces = self.split(volume, options.air_gap)?;
        let count = pieces.len();

        for (i, piece) in pieces.into_iter().enumerate() {
            let drawn = geometry.draw_per_well(self.pipette.channels, piece);
            let pickup = reagent.next_pickup(geometry.cross_section_area, drawn)?;
            let index = reagent.current_well_index();
            let source = sources.get(index).ok_or_else(|| {
                StationError::configuration(format!(
                    "{} is on well {} but only {} source wells are placed",
                    reagent.name(),
                    index,
                    sources.len()
                ))
            })?;

            if pickup.well_changed {
                debug!(reagent = %reagent.name(), well = %source, "New reservoir well, remixing");
                if let Some(mix) = remix {
                    self.mix(reagent, source, mix)?;
                }
            }

            let step = TransferOptions {
                pickup_height: pickup.height,
                ..options.clone()
            };
            let rinse = options.rinse && i == 0;
            self.move_once(reagent, source, dest, piece, &step, rinse)?;
        }
        Ok(count)
    }

    fn move_once(
        &mut self,
        reagent: &Reagent,
        source: &Well,
        dest: &Well,
        volume: Microliters,
        options: &TransferOptions,
        rinse: bool,
    ) -> StationResult<()> {
        let capacity = self.pipette.capacity;
        if volume + options.air_gap > capacity + VOLUME_TOLERANCE {
            return Err(StationError::TransferVolumeOverflow {
                volume: volume + options.air_gap,
                capacity,
            });
        }

        let mount = self.pipette.mount;
        let spec = reagent.spec();

        if rinse {
            let rinse_mix = MixOptions::new(volume, spec.rinse_loops)
                .blow_out(true)
                .x_offsets(options.source_x_offset, options.dest_x_offset);
            self.mix(reagent, source, &rinse_mix)?;
        }

        let pickup = source.bottom(options.pickup_height).shifted_x(options.source_x_offset);
        self.actuator
            .aspirate(mount, volume, &pickup, spec.flow_rate_aspirate);
        if options.air_gap > 0.0 {
            self.actuator
                .aspirate(mount, options.air_gap, &source.top(-2.0), spec.flow_rate_aspirate);
        }

        let drop = dest.top(options.dispense_height).shifted_x(options.dest_x_offset);
        self.actuator.move_to(mount, &drop);
        self.actuator
            .dispense(mount, volume + options.air_gap, &drop, spec.flow_rate_dispense);
        self.actuator.delay(spec.dispense_delay_seconds);

        if options.blow_out {
            self.actuator.blow_out(mount, &dest.top(-2.0));
        }
        if let Some(extra) = options.post_dispense {
            self.actuator
                .dispense(mount, extra, &dest.top(-2.0), spec.flow_rate_dispense);
        }
        if options.touch_tip {
            self.actuator.touch_tip(mount, dest, TouchTip::default());
        }
        if let Some(air) = options.post_airgap {
            self.actuator
                .aspirate(mount, air, &dest.top(-2.0), spec.flow_rate_aspirate);
        }
        Ok(())
    }

    /// Mix `options.volume` in place for `options.rounds` cycles
    pub fn mix(&mut self, reagent: &Reagent, well: &Well, options: &MixOptions) -> StationResult<()> {
        let capacity = self.pipette.capacity;
        if options.volume + 1.0 > capacity + VOLUME_TOLERANCE {
            return Err(StationError::TransferVolumeOverflow {
                volume: options.volume + 1.0,
                capacity,
            });
        }

        let mount = self.pipette.mount;
        let spec = reagent.spec();
        let low = well.bottom(options.source_height).shifted_x(options.source_x_offset);
        let high = well
            .bottom(options.effective_mix_height())
            .shifted_x(options.dest_x_offset);

        self.actuator.aspirate(mount, 1.0, &low, spec.flow_rate_aspirate_mix);
        for _ in 0..options.rounds {
            self.actuator
                .aspirate(mount, options.volume, &low, spec.flow_rate_aspirate_mix);
            self.actuator
                .dispense(mount, options.volume, &high, spec.flow_rate_dispense_mix);
        }
        self.actuator.dispense(mount, 1.0, &high, spec.flow_rate_dispense_mix);

        if options.blow_out {
            self.actuator.blow_out(mount, &well.top(-2.0));
        }
        if let Some(extra) = options.post_dispense {
            self.actuator
                .dispense(mount, extra, &well.top(-2.0), spec.flow_rate_dispense_mix);
        }
        if let Some(air) = options.post_airgap {
            self.actuator
                .aspirate(mount, air, &well.top(5.0), spec.flow_rate_aspirate_mix);
        }
        Ok(())
    }

    /// One aspirate, many dispenses. Leftover `extra_dispensal` is blown
    /// out into `waste`. Returns the volume delivered to destinations.
    #[allow(clippy::too_many_arguments)]
    pub fn distribute(
        &mut self,
        reagent: &Reagent,
        volume: Microliters,
        source: &Well,
        dests: &[Well],
        waste: &Well,
        pickup_height: f64,
        extra_dispensal: Microliters,
    ) -> StationResult<Microliters> {
        let load = dests.len() as f64 * volume + extra_dispensal;
        let capacity = self.pipette.capacity;
        if load + DISTRIBUTE_AIR_GAP > capacity + VOLUME_TOLERANCE {
            return Err(StationError::TransferVolumeOverflow {
                volume: load + DISTRIBUTE_AIR_GAP,
                capacity,
            });
        }

        let mount = self.pipette.mount;
        let spec = reagent.spec();

        self.actuator
            .aspirate(mount, load, &source.bottom(pickup_height), spec.flow_rate_aspirate);
        self.actuator.touch_tip(
            mount,
            source,
            TouchTip {
                radius: 1.0,
                ..TouchTip::default()
            },
        );
        let above_source = source.top(5.0);
        self.actuator.move_to(mount, &above_source);
        self.actuator
            .aspirate(mount, DISTRIBUTE_AIR_GAP, &above_source, spec.flow_rate_aspirate);

        for dest in dests {
            self.actuator
                .dispense(mount, DISTRIBUTE_AIR_GAP, &dest.top(0.0), spec.flow_rate_dispense);
            self.actuator
                .dispense(mount, volume, &dest.top(0.0), spec.flow_rate_dispense);
            self.actuator.delay(spec.dispense_delay_seconds);
            let above = dest.top(5.0);
            self.actuator.move_to(mount, &above);
            self.actuator
                .aspirate(mount, DISTRIBUTE_AIR_GAP, &above, spec.flow_rate_aspirate);
        }

        self.actuator.blow_out(mount, &waste.bottom(pickup_height + 3.0));
        Ok(dests.len() as f64 * volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::labware::Anchor;
    use crate::core::reservoir::ReagentSpec;
    use crate::core::tips::Mount;
    use crate::traits::MockActuator;
    use mockall::Sequence;

    fn p300() -> Pipette {
        Pipette::multichannel("p300", Mount::Right, 180.0)
    }

    fn wash() -> Reagent {
        let spec = ReagentSpec::new("Wash", 10_000.0, 1)
            .flow_rates(0.75, 1.0)
            .dispense_delay(3.0);
        Reagent::new(spec).unwrap()
    }

    #[test]
    fn test_split_accounts_for_air_gap() {
        let mut actuator = MockActuator::new();
        let pipette = p300();
        let planner = TransferPlanner::new(&mut actuator, &pipette);
        assert_eq!(planner.split(170.0, 10.0).unwrap(), vec![170.0]);
        assert_eq!(planner.split(175.0, 10.0).unwrap(), vec![88.0, 87.0]);
        assert!(matches!(
            planner.split(100.0, 180.0),
            Err(StationError::TransferVolumeOverflow { .. })
        ));
        assert!(matches!(
            planner.split(0.0, 0.0),
            Err(StationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_transfer_primitive_order() {
        let mut actuator = MockActuator::new();
        let mut seq = Sequence::new();

        actuator
            .expect_aspirate()
            .withf(|_, v, loc, rate| *v == 100.0 && loc.anchor == Anchor::Bottom && loc.z == 1.5 && loc.x == -1.0 && *rate == 0.75)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_aspirate()
            .withf(|_, v, loc, _| *v == 10.0 && loc.anchor == Anchor::Top && loc.z == -2.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_move_to()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_dispense()
            .withf(|_, v, loc, rate| *v == 110.0 && loc.well.labware == "plate" && loc.x == 1.0 && *rate == 1.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_delay()
            .withf(|s| *s == 3.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_blow_out()
            .withf(|_, loc| loc.well.labware == "plate" && loc.anchor == Anchor::Top && loc.z == -2.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_dispense()
            .withf(|_, v, _, _| *v == 20.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_touch_tip()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        actuator
            .expect_aspirate()
            .withf(|_, v, _, _| *v == 10.0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let pipette = p300();
        let mut planner = TransferPlanner::new(&mut actuator, &pipette);
        let options = TransferOptions::default()
            .air_gap(10.0)
            .x_offsets(-1.0, 1.0)
            .pickup_height(1.5)
            .blow_out(true)
            .post_dispense(DEFAULT_POST_DISPENSE)
            .touch_tip(true)
            .post_airgap(DEFAULT_POST_AIRGAP);
        let count = planner
            .transfer(&wash(), &Well::new("res", "A1"), &Well::new("plate", "A1"), 100.0, &options)
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rinse_only_before_first_piece() {
        let mut actuator = MockActuator::new();
        // rinse: 1 + 2 rounds aspirate; pieces: 2 x (liquid)
        actuator.expect_aspirate().times(1 + 2 + 2).return_const(());
        // rinse: 2 rounds + 1 dispense; pieces: 2
        actuator.expect_dispense().times(2 + 1 + 2).return_const(());
        actuator.expect_blow_out().times(1).return_const(());
        actuator.expect_move_to().times(2).return_const(());
        actuator.expect_delay().times(2).return_const(());

        let pipette = p300();
        let mut planner = TransferPlanner::new(&mut actuator, &pipette);
        let options = TransferOptions::default().rinse(true);
        let count = planner
            .transfer(&wash(), &Well::new("res", "A1"), &Well::new("plate", "A1"), 300.0, &options)
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_mix_defaults_to_three_mm() {
        let mut actuator = MockActuator::new();
        actuator
            .expect_aspirate()
            .withf(|_, _, loc, rate| loc.z == 3.0 && *rate == 4.0)
            .times(11)
            .return_const(());
        actuator
            .expect_dispense()
            .withf(|_, _, loc, rate| loc.z == 3.0 && *rate == 4.0)
            .times(11)
            .return_const(());
        actuator.expect_blow_out().times(1).return_const(());

        let pipette = p300();
        let mut planner = TransferPlanner::new(&mut actuator, &pipette);
        let mix = MixOptions::new(150.0, 10).blow_out(true);
        planner.mix(&wash(), &Well::new("res", "A1"), &mix).unwrap();
    }

    #[test]
    fn test_distribute_sequence_and_overflow() {
        let mut actuator = MockActuator::new();
        actuator
            .expect_aspirate()
            .withf(|_, v, _, _| *v == 4.0 * 20.0 + 10.0)
            .times(1)
            .return_const(());
        // initial air gap + one per destination
        actuator
            .expect_aspirate()
            .withf(|_, v, _, _| *v == DISTRIBUTE_AIR_GAP)
            .times(5)
            .return_const(());
        actuator.expect_dispense().times(8).return_const(());
        actuator.expect_touch_tip().times(1).return_const(());
        actuator.expect_move_to().times(5).return_const(());
        actuator.expect_delay().times(4).return_const(());
        actuator
            .expect_blow_out()
            .withf(|_, loc| loc.well.labware == "waste" && loc.z == 4.0)
            .times(1)
            .return_const(());

        let pipette = p300();
        let mut planner = TransferPlanner::new(&mut actuator, &pipette);
        let dests = Well::row_a("pcr", 1, 4);
        let delivered = planner
            .distribute(&wash(), 20.0, &Well::new("mmix", "A1"), &dests, &Well::new("waste", "A1"), 1.0, 10.0)
            .unwrap();
        assert_eq!(delivered, 80.0);

        let dests = Well::row_a("pcr", 1, 9);
        let result = planner.distribute(&wash(), 20.0, &Well::new("mmix", "A1"), &dests, &Well::new("waste", "A1"), 1.0, 10.0);
        assert!(matches!(result, Err(StationError::TransferVolumeOverflow { .. })));
    }
}
