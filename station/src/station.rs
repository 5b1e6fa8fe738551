//! Station driver
//!
//! Owns the run context and the injected services, and provides the
//! building blocks every station script uses: timed steps, tip handling
//! with operator pauses, incubation waits and reservoir-tracked plate fills.

use shared::{logging, station_debug, station_info, station_warn, Microliters, StationId, StepRecord};
use std::time::Instant;

use crate::{
    core::{MixOptions, Pipette, Reagent, ReservoirGeometry, TransferOptions, TransferPlanner, Well},
    error::StationResult,
    state::{RunContext, RunSummary},
    traits::{Actuator, Operator, RunLogSink},
};

/// How tips are used while filling a plate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipPolicy {
    /// One set of tips for every column
    Reuse,
    /// Fresh tips for each column
    PerColumn,
}

/// A plate fill from a tracked reservoir
#[derive(Debug, Clone)]
pub struct FillPlan {
    pub geometry: ReservoirGeometry,
    /// Reservoir wells in the order the reagent uses them
    pub sources: Vec<Well>,
    /// One destination per column
    pub dests: Vec<Well>,
    pub volume: Microliters,
    pub options: TransferOptions,
    /// Mix applied to a reservoir well when the reagent moves onto it
    pub remix: Option<MixOptions>,
    pub tips: TipPolicy,
}

/// Station that drives one robot run with injected services
pub struct Station<A, L, O>
where
    A: Actuator,
    L: RunLogSink,
    O: Operator,
{
    ctx: RunContext,
    actuator: A,
    run_log: L,
    operator: O,
}

impl<A, L, O> Station<A, L, O>
where
    A: Actuator,
    L: RunLogSink,
    O: Operator,
{
    /// Create new station with injected dependencies
    pub fn new(ctx: RunContext, actuator: A, run_log: L, operator: O) -> Self {
        logging::log_run_started(ctx.metadata());
        Self {
            ctx,
            actuator,
            run_log,
            operator,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RunContext {
        &mut self.ctx
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn run_log(&self) -> &L {
        &self.run_log
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Run step `number` if it is enabled, timing it and logging the result.
    /// Disabled steps are logged as not executed and `body` is not called.
    pub fn run_step<F>(&mut self, number: u32, body: F) -> StationResult<()>
    where
        F: FnOnce(&mut Self) -> StationResult<()>,
    {
        let step = self.ctx.step(number)?.clone();
        if !step.execute {
            station_debug!(StationId::current(), step = number, "Step disabled, skipping");
            return self.run_log.record(&StepRecord::skipped(
                number,
                &step.description,
                step.wait_time_seconds,
            ));
        }

        station_info!(StationId::current(), "Step {}: {}", number, step.description);
        let run_id = self.ctx.metadata().run_id;
        let started = Instant::now();
        if let Err(e) = body(self) {
            logging::log_step_failed(StationId::current(), &run_id, number, &e);
            return Err(e);
        }
        let elapsed = started.elapsed();

        self.ctx.mark_completed(number, elapsed)?;
        self.run_log.record(&StepRecord::completed(
            number,
            &step.description,
            step.wait_time_seconds,
            elapsed,
        ))?;
        logging::log_step_completed(StationId::current(), &run_id, number, elapsed);
        Ok(())
    }

    /// Incubation or settling wait
    pub fn wait(&mut self, seconds: u64, message: &str) {
        self.operator.comment(message);
        self.actuator.delay(seconds as f64);
    }

    /// Pick up tips, pausing for the operator to replace racks when the
    /// loaded ones are used up. Reagent state is untouched by the pause.
    pub fn pick_up(&mut self, pipette: &Pipette) -> StationResult<()> {
        let tracker = self.ctx.tips_mut(pipette.mount)?;
        match tracker.pick_up() {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                station_warn!(StationId::current(), error = %e, "Tip racks exhausted");
                self.operator.pause(&format!(
                    "Replace {} ul tipracks before resuming.",
                    pipette.capacity
                ))?;
                let tracker = self.ctx.tips_mut(pipette.mount)?;
                tracker.reset();
                tracker.pick_up()?;
            }
            Err(e) => return Err(e),
        }
        self.actuator.pick_up_tip(pipette.mount);
        Ok(())
    }

    pub fn drop_tip(&mut self, pipette: &Pipette) {
        self.actuator.drop_tip(pipette.mount);
    }

    /// Planner bound to this station's actuator
    pub fn planner<'a>(&'a mut self, pipette: &'a Pipette) -> TransferPlanner<'a, A> {
        TransferPlanner::new(&mut self.actuator, pipette)
    }

    /// Fill one destination per column from a tracked reservoir.
    ///
    /// Rinse, when requested, happens on the first draw of the fill only.
    pub fn fill_columns(
        &mut self,
        pipette: &Pipette,
        reagent: &mut Reagent,
        plan: &FillPlan,
    ) -> StationResult<()> {
        station_debug!(
            StationId::current(),
            reagent = %reagent.name(),
            columns = plan.dests.len(),
            volume = plan.volume,
            "Filling columns"
        );

        if plan.tips == TipPolicy::Reuse {
            self.pick_up(pipette)?;
        }

        for (i, dest) in plan.dests.iter().enumerate() {
            if plan.tips == TipPolicy::PerColumn {
                self.pick_up(pipette)?;
            }

            let options = TransferOptions {
                rinse: plan.options.rinse && i == 0,
                ..plan.options.clone()
            };
            self.planner(pipette).transfer_from_reservoir(
                reagent,
                &plan.geometry,
                &plan.sources,
                dest,
                plan.volume,
                &options,
                plan.remix.as_ref(),
            )?;

            if plan.tips == TipPolicy::PerColumn {
                self.drop_tip(pipette);
            }
        }

        if plan.tips == TipPolicy::Reuse {
            self.drop_tip(pipette);
        }
        Ok(())
    }

    /// Close the run: flush the log and report reagent and tip usage
    pub fn finish(mut self, reagents: &[&Reagent]) -> StationResult<RunSummary> {
        self.run_log.finish()?;
        let summary = self.ctx.into_summary(reagents);
        for usage in &summary.reagents {
            station_info!(
                StationId::current(),
                reagent = %usage.name,
                abandoned = usage.abandoned,
                remaining = usage.remaining,
                "Reagent usage"
            );
        }
        let completed = summary.steps.iter().filter(|s| s.elapsed.is_some()).count();
        logging::log_run_finished(
            StationId::current(),
            &summary.metadata.run_id,
            completed,
            summary.total_elapsed,
        );
        Ok(summary)
    }
}
