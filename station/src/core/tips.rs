//! Tip rack accounting per pipette

use serde::{Deserialize, Serialize};

use crate::error::{StationError, StationResult};

pub const TIPS_PER_RACK: u32 = 96;

/// A pipette mounted on the robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipette {
    pub name: String,
    pub mount: Mount,
    /// Usable volume per tip; kept below the nominal tip volume
    pub capacity: f64,
    pub channels: u32,
}

impl Pipette {
    pub fn multichannel(name: impl Into<String>, mount: Mount, capacity: f64) -> Self {
        Self {
            name: name.into(),
            mount,
            capacity,
            channels: shared::CHANNEL_WIDTH,
        }
    }

    pub fn single(name: impl Into<String>, mount: Mount, capacity: f64) -> Self {
        Self {
            name: name.into(),
            mount,
            capacity,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mount {
    Left,
    Right,
}

impl std::fmt::Display for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mount::Left => write!(f, "left"),
            Mount::Right => write!(f, "right"),
        }
    }
}

/// Tips used from the racks loaded for one pipette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipTracker {
    pipette: String,
    channels: u32,
    capacity: u32,
    used: u32,
    total_used: u32,
}

impl TipTracker {
    pub fn new(pipette: &Pipette, racks: u32) -> Self {
        Self {
            pipette: pipette.name.clone(),
            channels: pipette.channels,
            capacity: racks * TIPS_PER_RACK,
            used: 0,
            total_used: 0,
        }
    }

    /// Count one pickup; fails when the loaded racks cannot supply it
    pub fn pick_up(&mut self) -> StationResult<()> {
        if self.used + self.channels > self.capacity {
            return Err(StationError::ConsumableExhausted {
                pipette: self.pipette.clone(),
                capacity: self.capacity,
            });
        }
        self.used += self.channels;
        self.total_used += self.channels;
        Ok(())
    }

    /// Racks were replaced
    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    /// Tips used over the whole run, across rack replacements
    pub fn total_used(&self) -> u32 {
        self.total_used
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn pipette(&self) -> &str {
        &self.pipette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multichannel_uses_a_column_per_pickup() {
        let pipette = Pipette::multichannel("p300", Mount::Right, 180.0);
        let mut tracker = TipTracker::new(&pipette, 1);
        for _ in 0..12 {
            tracker.pick_up().unwrap();
        }
        assert_eq!(tracker.used(), 96);
        assert!(matches!(
            tracker.pick_up(),
            Err(StationError::ConsumableExhausted { capacity: 96, .. })
        ));
    }

    #[test]
    fn test_reset_keeps_run_total() {
        let pipette = Pipette::single("p20", Mount::Left, 20.0);
        let mut tracker = TipTracker::new(&pipette, 1);
        for _ in 0..96 {
            tracker.pick_up().unwrap();
        }
        assert!(tracker.pick_up().unwrap_err().is_recoverable());
        tracker.reset();
        tracker.pick_up().unwrap();
        assert_eq!(tracker.used(), 1);
        assert_eq!(tracker.total_used(), 97);
    }

    #[test]
    fn test_no_racks_means_no_tips() {
        let pipette = Pipette::single("p1000", Mount::Left, 1000.0);
        let mut tracker = TipTracker::new(&pipette, 0);
        assert!(tracker.pick_up().is_err());
    }
}
