//! Test helpers and builder patterns for station tests
//!
//! `StationBuilder` wires a `Station` with mocks or in-memory services so
//! each test only sets up the collaborators it cares about.

use station::core::{Pipette, ReservoirGeometry, TransferOptions};
use station::services::{MemoryRunLog, SimulatedActuator};
use station::traits::{MockActuator, MockOperator, MockRunLogSink};
use station::{Actuator, FillPlan, Operator, RunContext, RunLogSink, Station, TipPolicy};

use super::fixtures::TestFixtures;

/// Builder for test stations with permissive defaults
pub struct StationBuilder<A, L, O> {
    actuator: A,
    run_log: L,
    operator: O,
    steps: Vec<station::ProtocolStep>,
    racks: u32,
    pipette: Pipette,
}

#[allow(dead_code)]
impl StationBuilder<SimulatedActuator, MemoryRunLog, MockOperator> {
    /// Simulated robot, in-memory log and an operator that must not be paused
    pub fn new() -> Self {
        let mut operator = MockOperator::new();
        operator.expect_comment().returning(|_| ()).times(0..);
        operator.expect_pause().never();

        Self {
            actuator: SimulatedActuator::new(),
            run_log: MemoryRunLog::new(),
            operator,
            steps: TestFixtures::steps(),
            racks: 2,
            pipette: TestFixtures::multichannel(),
        }
    }
}

#[allow(dead_code)]
impl<A: Actuator, L: RunLogSink, O: Operator> StationBuilder<A, L, O> {
    pub fn with_actuator<B: Actuator>(self, actuator: B) -> StationBuilder<B, L, O> {
        StationBuilder {
            actuator,
            run_log: self.run_log,
            operator: self.operator,
            steps: self.steps,
            racks: self.racks,
            pipette: self.pipette,
        }
    }

    pub fn with_run_log<M: RunLogSink>(self, run_log: M) -> StationBuilder<A, M, O> {
        StationBuilder {
            actuator: self.actuator,
            run_log,
            operator: self.operator,
            steps: self.steps,
            racks: self.racks,
            pipette: self.pipette,
        }
    }

    pub fn with_operator<P: Operator>(self, operator: P) -> StationBuilder<A, L, P> {
        StationBuilder {
            actuator: self.actuator,
            run_log: self.run_log,
            operator,
            steps: self.steps,
            racks: self.racks,
            pipette: self.pipette,
        }
    }

    pub fn with_steps(mut self, steps: Vec<station::ProtocolStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_racks(mut self, racks: u32) -> Self {
        self.racks = racks;
        self
    }

    pub fn build(self) -> Station<A, L, O> {
        let mut ctx = RunContext::new(TestFixtures::metadata(), self.steps);
        ctx.register_pipette(&self.pipette, self.racks);
        Station::new(ctx, self.actuator, self.run_log, self.operator)
    }
}

/// Common test operations
pub struct TestHelpers;

#[allow(dead_code)]
impl TestHelpers {
    /// Actuator mock that accepts any primitive
    pub fn permissive_actuator() -> MockActuator {
        let mut actuator = MockActuator::new();
        actuator.expect_aspirate().returning(|_, _, _, _| ()).times(0..);
        actuator.expect_dispense().returning(|_, _, _, _| ()).times(0..);
        actuator.expect_move_to().returning(|_, _| ()).times(0..);
        actuator.expect_delay().returning(|_| ()).times(0..);
        actuator.expect_pick_up_tip().returning(|_| ()).times(0..);
        actuator.expect_drop_tip().returning(|_| ()).times(0..);
        actuator.expect_blow_out().returning(|_, _| ()).times(0..);
        actuator.expect_touch_tip().returning(|_, _, _| ()).times(0..);
        actuator
    }

    /// Run log mock that accepts any record
    pub fn permissive_run_log() -> MockRunLogSink {
        let mut run_log = MockRunLogSink::new();
        run_log.expect_record().returning(|_| Ok(())).times(0..);
        run_log.expect_finish().returning(|| Ok(())).times(0..);
        run_log
    }

    /// Fill plan drawing from `wells` trough columns into `columns` plate columns
    pub fn trough_plan(wells: u32, columns: u32, volume: f64, tips: TipPolicy) -> FillPlan {
        FillPlan {
            geometry: ReservoirGeometry::nest_12_reservoir(),
            sources: TestFixtures::reservoir_wells(wells),
            dests: TestFixtures::plate_columns(columns),
            volume,
            options: TransferOptions::default().air_gap(10.0),
            remix: None,
            tips,
        }
    }
}
