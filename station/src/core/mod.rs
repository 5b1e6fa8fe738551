//! Core liquid-handling logic
//!
//! Pure bookkeeping and sequencing with no I/O: volume tracking, recipe
//! scaling, transfer planning and tip accounting. Robot motion goes through
//! the `Actuator` trait only.

pub mod labware;
pub mod planner;
pub mod recipe;
pub mod reservoir;
pub mod tips;
pub mod volume;

pub use labware::{Anchor, Location, ReservoirGeometry, Well};
pub use planner::{split_transfer, MixOptions, TransferOptions, TransferPlanner};
pub use recipe::{
    compute_recipe, LabwareLayout, MasterMixKind, ReagentCategory, ReagentKey, Recipe, RecipeEntry,
    RecipeTable,
};
pub use reservoir::{HeightPolicy, PickupHeight, Reagent, ReagentSpec};
pub use tips::{Mount, Pipette, TipTracker};
pub use volume::{divide_destinations, divide_volume, magnet_side};
