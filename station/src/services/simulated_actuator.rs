//! Dry-run actuator
//!
//! Records every primitive instead of moving a robot. Used by the
//! `simulate` command and by integration tests that want to inspect the
//! full command stream rather than set mock expectations.

use serde::{Deserialize, Serialize};
use shared::{station_debug, Microliters, StationId};
use std::time::Duration;

use crate::core::labware::{Location, Well};
use crate::core::tips::Mount;
use crate::traits::{Actuator, TouchTip};

/// One recorded primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ActuatorCommand {
    Aspirate {
        mount: Mount,
        volume: Microliters,
        location: Location,
        rate: f64,
    },
    Dispense {
        mount: Mount,
        volume: Microliters,
        location: Location,
        rate: f64,
    },
    MoveTo {
        mount: Mount,
        location: Location,
    },
    Delay {
        seconds: f64,
    },
    PickUpTip {
        mount: Mount,
    },
    DropTip {
        mount: Mount,
    },
    BlowOut {
        mount: Mount,
        location: Location,
    },
    TouchTip {
        mount: Mount,
        well: Well,
        speed: f64,
        v_offset: f64,
        radius: f64,
    },
}

/// Actuator that records commands
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    commands: Vec<ActuatorCommand>,
    real_time: bool,
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep through delays instead of only recording them
    pub fn real_time(mut self, real_time: bool) -> Self {
        self.real_time = real_time;
        self
    }

    pub fn commands(&self) -> &[ActuatorCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<ActuatorCommand> {
        self.commands
    }

    /// Liquid dispensed into wells of `labware`, air gaps included
    pub fn dispensed_into(&self, labware: &str) -> Microliters {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ActuatorCommand::Dispense { volume, location, .. }
                    if location.well.labware == labware =>
                {
                    Some(*volume)
                }
                _ => None,
            })
            .sum()
    }

    pub fn count(&self, predicate: impl Fn(&ActuatorCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    fn push(&mut self, command: ActuatorCommand) {
        station_debug!(StationId::current(), command = ?command, "Actuator command");
        self.commands.push(command);
    }
}

impl Actuator for SimulatedActuator {
    fn aspirate(&mut self, mount: Mount, volume: Microliters, location: &Location, rate: f64) {
        self.push(ActuatorCommand::Aspirate {
            mount,
            volume,
            location: location.clone(),
            rate,
        });
    }

    fn dispense(&mut self, mount: Mount, volume: Microliters, location: &Location, rate: f64) {
        self.push(ActuatorCommand::Dispense {
            mount,
            volume,
            location: location.clone(),
            rate,
        });
    }

    fn move_to(&mut self, mount: Mount, location: &Location) {
        self.push(ActuatorCommand::MoveTo {
            mount,
            location: location.clone(),
        });
    }

    fn delay(&mut self, seconds: f64) {
        if self.real_time && seconds > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
        self.push(ActuatorCommand::Delay { seconds });
    }

    fn pick_up_tip(&mut self, mount: Mount) {
        self.push(ActuatorCommand::PickUpTip { mount });
    }

    fn drop_tip(&mut self, mount: Mount) {
        self.push(ActuatorCommand::DropTip { mount });
    }

    fn blow_out(&mut self, mount: Mount, location: &Location) {
        self.push(ActuatorCommand::BlowOut {
            mount,
            location: location.clone(),
        });
    }

    fn touch_tip(&mut self, mount: Mount, well: &Well, params: TouchTip) {
        self.push(ActuatorCommand::TouchTip {
            mount,
            well: well.clone(),
            speed: params.speed,
            v_offset: params.v_offset,
            radius: params.radius,
        });
    }
}
