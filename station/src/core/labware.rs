//! Labware geometry and deck locations
//!
//! Geometry values are the handful of constants the extraction protocols
//! rely on; the full labware catalogue belongs to the robot runtime.

use serde::{Deserialize, Serialize};
use shared::Microliters;
use std::f64::consts::PI;

/// Fluid geometry of a reservoir well
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservoirGeometry {
    /// Horizontal cross-section in mm^2
    pub cross_section_area: f64,
    /// Volume trapped below the flat part of the well
    pub dead_volume: Microliters,
    /// Height of the conical/rounded bottom in mm
    pub conical_height: f64,
    /// Largest volume a single well may be filled with
    pub max_well_capacity: Microliters,
    /// Tips of a multichannel head that draw from the same well at once
    pub channels_per_well: u32,
}

impl ReservoirGeometry {
    /// NEST 12-well 15 ml reservoir
    pub fn nest_12_reservoir() -> Self {
        Self {
            cross_section_area: 8.2 * 71.2,
            dead_volume: 695.0,
            conical_height: 1.95,
            max_well_capacity: 13_500.0,
            channels_per_well: shared::CHANNEL_WIDTH,
        }
    }

    /// Generic 12-well reservoir used when the labware is not a NEST one
    pub fn generic_12_reservoir() -> Self {
        Self {
            max_well_capacity: 12_400.0,
            ..Self::nest_12_reservoir()
        }
    }

    /// 2 ml screwcap tube in an aluminium block
    pub fn screwcap_2ml() -> Self {
        let diameter: f64 = 8.25;
        let area = PI * diameter.powi(2) / 4.0;
        let cone_volume = 50.0;
        Self {
            cross_section_area: area,
            dead_volume: cone_volume,
            conical_height: 3.0 * cone_volume / area,
            max_well_capacity: 2_000.0,
            channels_per_well: 1,
        }
    }

    /// 8-tube strip, one tube per channel
    pub fn tube_strip() -> Self {
        Self {
            cross_section_area: 15.0,
            dead_volume: 10.0,
            conical_height: 1.0,
            max_well_capacity: 1_500.0,
            channels_per_well: 1,
        }
    }

    /// Volume leaving one well when every channel of `pipette_channels`
    /// draws `volume`
    pub fn draw_per_well(&self, pipette_channels: u32, volume: Microliters) -> Microliters {
        volume * pipette_channels.min(self.channels_per_well) as f64
    }
}

/// A well on a piece of labware, e.g. `reagent_res:A3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Well {
    pub labware: String,
    pub name: String,
}

impl Well {
    pub fn new(labware: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            labware: labware.into(),
            name: name.into(),
        }
    }

    /// Row-A wells of `count` consecutive columns starting at column `first`
    pub fn row_a(labware: &str, first: u32, count: u32) -> Vec<Well> {
        (first..first + count)
            .map(|column| Well::new(labware, format!("A{column}")))
            .collect()
    }

    /// Column number parsed from the well name, `A7` -> 7
    pub fn column(&self) -> Option<u32> {
        self.name.get(1..).and_then(|digits| digits.parse().ok())
    }

    pub fn bottom(&self, z: f64) -> Location {
        Location::new(self.clone(), Anchor::Bottom, z)
    }

    pub fn top(&self, z: f64) -> Location {
        Location::new(self.clone(), Anchor::Top, z)
    }
}

impl std::fmt::Display for Well {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.labware, self.name)
    }
}

/// Vertical reference a location offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    Bottom,
    Top,
}

/// A point inside or above a well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub well: Well,
    pub anchor: Anchor,
    pub z: f64,
    pub x: f64,
}

impl Location {
    pub fn new(well: Well, anchor: Anchor, z: f64) -> Self {
        Self { well, anchor, z, x: 0.0 }
    }

    pub fn shifted_x(mut self, dx: f64) -> Self {
        self.x += dx;
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let anchor = match self.anchor {
            Anchor::Bottom => "bottom",
            Anchor::Top => "top",
        };
        write!(f, "{} {}({:.2}) x{:+.2}", self.well, anchor, self.z, self.x)
    }
}
