//! Grid scene visualization
//!
//! Run with: cargo run -p viz
//!
//! Examples:
//!   cargo run -p viz -- --config vis.toml --actors 200
//!   cargo run -p viz -- --headless --frames 500 --report report.json
//!   cargo run -p viz -- --dump-config > vis.toml

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bevy::prelude::*;
use clap::Parser;

use scene::{default_config_toml, ConfigError, VisConfig, VisOptions};
use viz::demo::{apply_demo_styles, build_simulation, DemoSettings};
use viz::headless::{run_headless, write_report};
use viz::runtime::{BevyReconciler, VisRuntime};
use viz::VisPlugin;

/// Grid scene visualization
#[derive(Parser, Debug)]
#[command(name = "viz")]
#[command(about = "Renders a grid simulation through the scene reconciler")]
struct Args {
    /// TOML file with visual options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    dump_config: bool,

    /// Random seed for the demo simulation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Side length of a grid square
    #[arg(long, default_value_t = 20.0)]
    grid_step: f64,

    /// Number of actors
    #[arg(long, default_value_t = 40)]
    actors: usize,

    /// Number of zones
    #[arg(long, default_value_t = 3)]
    zones: usize,

    /// Finish the simulation after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Use only the configured constants, without the demo's callbacks
    #[arg(long)]
    plain: bool,

    /// Run without a window against the in-memory scene
    #[arg(long)]
    headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = 1000)]
    frames: u64,

    /// Where to write the headless report (stdout if omitted)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Close the window once the simulation finishes
    #[arg(long)]
    exit_on_finish: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,wgpu=warn,naga=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_options(path: Option<&Path>, plain: bool) -> Result<VisOptions, ConfigError> {
    let config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading visual config");
            VisConfig::from_file(path)?
        }
        None => VisConfig::default(),
    };
    let mut options = config.into_options();
    if !plain {
        apply_demo_styles(&mut options);
    }
    Ok(options)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.dump_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    init_tracing();

    let options = match load_options(args.config.as_deref(), args.plain) {
        Ok(options) => options,
        Err(err) => {
            tracing::error!(error = %err, "Invalid visual config");
            return ExitCode::FAILURE;
        }
    };

    let settings = DemoSettings {
        width: args.width,
        height: args.height,
        grid_step: args.grid_step,
        actors: args.actors,
        zones: args.zones,
        seed: args.seed,
        max_ticks: args.max_ticks,
    };
    let mut sim = match build_simulation(&settings) {
        Ok(sim) => sim,
        Err(err) => {
            tracing::error!(error = %err, "Could not build simulation");
            return ExitCode::FAILURE;
        }
    };

    if args.headless {
        let mut reconciler = scene::Reconciler::new(options);
        let report = run_headless(&mut sim, &mut reconciler, args.frames);
        if let Err(err) = write_report(&report, args.report.as_deref()) {
            tracing::error!(error = %err, "Could not write report");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let runtime = VisRuntime::new(sim, BevyReconciler::new(options))
        .with_exit_on_finish(args.exit_on_finish);

    App::new()
        .insert_resource(runtime)
        .add_plugins(VisPlugin::default())
        .run();
    ExitCode::SUCCESS
}
