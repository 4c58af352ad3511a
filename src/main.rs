//! drage main entry point.
//!
//! A 2D platformer simulation written in Rust using:
//! - **bevy_ecs** for entity-component-system architecture
//! - **glam** for vector math
//! - **raylib** for the optional debug viewer (`viewer` feature)
//!
//! Levels are JSON files played in the order given on the command line.
//! Without the viewer the game runs headless for a number of frames, fed by
//! an optional input script, and logs where it ended up.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- assets/levels/level01.json assets/levels/level02.json \
//!     --input assets/input/demo.json --frames 900
//! cargo run --release --features viewer -- assets/levels/level01.json --view
//! ```

use std::path::PathBuf;

use clap::Parser;
use drage::game::{build_schedule, build_world, run_headless};
use drage::resources::gameconfig::GameConfig;
use drage::resources::input::InputScript;
use drage::resources::level::LevelManager;
use log::{error, info, warn};

/// Raycast platformer simulation
#[derive(Parser)]
#[command(version, about = "Plays platformer levels headless or in a debug viewer.")]
struct Cli {
    /// Level files, played in order.
    #[arg(required = true, value_name = "LEVEL")]
    levels: Vec<PathBuf>,

    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON input script replayed frame by frame.
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Frames to simulate headless (default from the config file).
    #[arg(long)]
    frames: Option<u64>,

    /// Open the raylib viewer instead of running headless.
    #[cfg(feature = "viewer")]
    #[arg(long)]
    view: bool,
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }

    let script = match &cli.input {
        Some(path) => Some(InputScript::load_from_file(&path.to_string_lossy())?),
        None => None,
    };
    let frames = cli.frames.unwrap_or(config.frames);

    let mut world = build_world(config, LevelManager::new(cli.levels), script);
    let mut schedule = build_schedule();

    #[cfg(feature = "viewer")]
    if cli.view {
        return drage::game::run_viewer(&mut world, &mut schedule);
    }

    let summary = run_headless(&mut world, &mut schedule, frames)?;
    info!("Final state: {:?}", summary.state);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
