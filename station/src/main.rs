//! Main entry point for the station binary
//!
//! `recipe` prints how much of each reagent to prepare for a run.
//! `simulate` dispenses every bulk reagent into a plate against the
//! simulated actuator and writes the run's time log.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shared::{logging, station_debug, station_info, ProtocolMode, StationId};
use station::{
    core::{Mount, Pipette},
    services::{ConsoleOperator, EnvSettingsSource, SimulatedActuator, TsvRunLog},
    ConfigOverrides, LabwareLayout, MasterMixKind, PlateFill, RecipeTable, RunContext,
    Station, StationConfig, StationResult,
};

/// Liquid-handling engine for RNA-extraction stations
#[derive(Parser)]
#[command(name = "station")]
#[command(about = "Scales extraction recipes and plans reagent transfers")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the reagent volumes and well counts for a run
    Recipe {
        /// Protocol mode: V (viral) or P (pathogen)
        #[arg(long)]
        mode: Option<ProtocolMode>,

        /// Number of samples, controls excluded
        #[arg(long)]
        samples: Option<u32>,

        /// Master-mix kit used to break down the MMIX volume
        #[arg(long, default_value = "universal")]
        master_mix: MasterMixKind,

        /// Print the recipe as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dispense the bulk reagents into a plate with the simulated robot
    Simulate {
        #[arg(long)]
        mode: Option<ProtocolMode>,

        #[arg(long)]
        samples: Option<u32>,

        /// Directory the run folder is created in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Name recorded in the run metadata
        #[arg(long)]
        technician: Option<String>,

        /// Tip racks loaded for the multichannel
        #[arg(long)]
        tip_racks: Option<u32>,
    },
}

fn main() -> StationResult<()> {
    let args = Args::parse();

    let overrides = match &args.command {
        Command::Recipe { mode, samples, .. } => ConfigOverrides {
            num_samples: *samples,
            mode: *mode,
            ..Default::default()
        },
        Command::Simulate {
            mode,
            samples,
            output,
            technician,
            tip_racks,
        } => ConfigOverrides {
            num_samples: *samples,
            mode: *mode,
            technician: technician.clone(),
            tip_racks: *tip_racks,
            output_dir: output.clone(),
            ..Default::default()
        },
    };
    let overrides = ConfigOverrides {
        log_level: args.log_level.clone(),
        ..overrides
    };

    let config = StationConfig::from_settings(&EnvSettingsSource::new())?.apply(overrides);
    StationId::init(config.station);
    logging::init_tracing_with_level(Some(&config.log_level));
    config.validate()?;

    station_debug!(
        StationId::current(),
        "Mode: {}, Samples: {}, Capacity: {} ul",
        config.mode,
        config.num_samples,
        config.pipette_capacity
    );

    match args.command {
        Command::Recipe {
            master_mix, json, ..
        } => print_recipe(&config, master_mix, json),
        Command::Simulate { .. } => simulate(&config),
    }
}

fn print_recipe(config: &StationConfig, master_mix: MasterMixKind, json: bool) -> StationResult<()> {
    let table = RecipeTable::builtin().with_master_mix(master_mix);
    let layout = LabwareLayout::for_mode(config.mode);
    let recipe = station::compute_recipe(
        config.mode,
        config.corrected_samples(),
        config.num_samples,
        &table,
        &layout,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    println!(
        "{} extraction, {} samples ({} corrected)",
        mode_label(config.mode),
        config.num_samples,
        config.corrected_samples()
    );
    for entry in recipe.values() {
        println!(
            "  {:<8} {:>3} well(s) x {:>8.1} ul = {:>9.1} ul",
            entry.key.to_string(),
            entry.well_count,
            entry.volume_per_well,
            entry.total_volume()
        );
    }
    if let Some(mmix) = recipe.get(&station::ReagentKey::Mmix) {
        println!("  {master_mix:?} master mix:");
        for (name, volume) in master_mix.component_volumes(mmix.volume_per_well) {
            println!("    {name:<18} {volume:>8.2} ul");
        }
    }
    Ok(())
}

fn simulate(config: &StationConfig) -> StationResult<()> {
    let table = RecipeTable::builtin();
    let layout = LabwareLayout::for_mode(config.mode);
    let pipette = Pipette::multichannel("p300_multi", Mount::Right, config.pipette_capacity);
    let mut fill = PlateFill::plan(config.mode, config.num_samples, &table, &layout, &pipette)?;

    let metadata = config.metadata();
    let log_path = config
        .output_dir
        .join(metadata.folder_label())
        .join("time_log.txt");
    let run_log = TsvRunLog::create(&log_path)?;

    let mut ctx = RunContext::new(metadata, fill.steps());
    ctx.register_pipette(&pipette, config.tip_racks);

    let mut station = Station::new(
        ctx,
        SimulatedActuator::new(),
        run_log,
        ConsoleOperator::unattended(),
    );
    fill.run(&mut station, &pipette)?;

    let commands = station.actuator().commands().len();
    let summary = station.finish(&fill.reagents())?;

    for usage in &summary.reagents {
        println!(
            "  {:<16} wells {}/{}  abandoned {:>8.1} ul  left {:>8.1} ul",
            usage.name, usage.wells_used, usage.well_count, usage.abandoned, usage.remaining
        );
    }
    for (pipette, tips) in &summary.tips_used {
        println!("  {pipette}: {tips} tips");
    }
    station_info!(
        StationId::current(),
        "{} robot commands, log written to {}",
        commands,
        log_path.display()
    );
    Ok(())
}

fn mode_label(mode: ProtocolMode) -> &'static str {
    match mode {
        ProtocolMode::Viral => "Viral",
        ProtocolMode::Pathogen => "Pathogen",
    }
}
