//! Liquid-handling engine for RNA-extraction stations
//!
//! Scales reagent recipes to the sample count, tracks the liquid left in
//! every reservoir well to pick aspiration heights, and turns transfer
//! requests into the primitive moves a pipetting robot executes. The robot,
//! the run log and the operator are injected through traits so a run can be
//! driven against hardware, a simulator or mocks.

pub mod config;
pub mod core;
pub mod error;
pub mod plate_fill;
pub mod presets;
pub mod services;
pub mod state;
pub mod station;
pub mod traits;

// Re-export commonly used types
pub use config::{ConfigOverrides, StationConfig};
pub use core::{
    compute_recipe, LabwareLayout, MasterMixKind, Pipette, Reagent, ReagentKey, ReagentSpec,
    Recipe, RecipeTable, TransferOptions, TransferPlanner,
};
pub use error::{StationError, StationResult};
pub use plate_fill::PlateFill;
pub use state::{ProtocolStep, RunContext, RunSummary};
pub use station::{FillPlan, Station, TipPolicy};
pub use traits::{Actuator, Operator, RunLogSink, SettingsSource};
