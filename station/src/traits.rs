//! Trait definitions with mockall annotations for testing
//!
//! These traits are the seams between the liquid-handling engine and the
//! outside world: the robot, the run log, the human operator and the
//! settings store. The `Station` driver is generic over them so tests can
//! inject mocks.

use shared::{Microliters, StepRecord};

use crate::core::labware::{Location, Well};
use crate::core::tips::Mount;
use crate::error::StationResult;

/// Touch-tip motion parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchTip {
    /// Lateral speed in mm/s
    pub speed: f64,
    /// Offset from the well top in mm
    pub v_offset: f64,
    /// Fraction of the well radius to touch at
    pub radius: f64,
}

impl Default for TouchTip {
    fn default() -> Self {
        Self {
            speed: 20.0,
            v_offset: -5.0,
            radius: 0.9,
        }
    }
}

/// Robot motion primitives
///
/// Calls are fire-and-forget: the engine trusts every primitive to succeed
/// and never reads state back from the robot.
#[mockall::automock]
pub trait Actuator {
    /// Draw `volume` at `location` with a flow rate multiplier of `rate`
    fn aspirate(&mut self, mount: Mount, volume: Microliters, location: &Location, rate: f64);

    /// Expel `volume` at `location` with a flow rate multiplier of `rate`
    fn dispense(&mut self, mount: Mount, volume: Microliters, location: &Location, rate: f64);

    fn move_to(&mut self, mount: Mount, location: &Location);

    /// Wait in place; incubation steps use this too
    fn delay(&mut self, seconds: f64);

    fn pick_up_tip(&mut self, mount: Mount);

    fn drop_tip(&mut self, mount: Mount);

    fn blow_out(&mut self, mount: Mount, location: &Location);

    fn touch_tip(&mut self, mount: Mount, well: &Well, params: TouchTip);
}

/// Destination for per-step execution records
#[mockall::automock]
pub trait RunLogSink {
    /// Store the record of one finished or skipped step
    fn record(&mut self, record: &StepRecord) -> StationResult<()>;

    /// Flush anything buffered; called once at the end of the run
    fn finish(&mut self) -> StationResult<()>;
}

/// The person attending the robot
#[mockall::automock]
pub trait Operator {
    /// Block until the operator confirms `message` has been acted on
    fn pause(&mut self, message: &str) -> StationResult<()>;

    /// Informational message shown without stopping
    fn comment(&mut self, message: &str);
}

/// Key/value settings lookup (environment, `.env` file)
#[mockall::automock]
pub trait SettingsSource {
    fn lookup(&self, key: &str) -> Option<String>;
}
