//! TieLink CLI
//!
//! Usage:
//!   tielink [OPTIONS] <SCENE>
//!
//! Options:
//!   -o, --output <FILE>  SVG file to write [default: diagram.svg]
//!   -c, --config <FILE>  Controller settings (JSON), overriding the scene's
//!   -g, --grid           Draw the background grid
//!   -h, --help           Print help

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use tielink_app::{AppResult, Scene, export_svg, run_scene};
use tielink_core::ControllerConfig;

#[derive(Parser)]
#[command(name = "tielink")]
#[command(about = "Replay pointer scripts against a TieLink diagram and export it as SVG")]
struct Cli {
    /// Scene file (JSON)
    scene: PathBuf,

    /// SVG file to write
    #[arg(short, long, default_value = "diagram.svg")]
    output: PathBuf,

    /// Controller settings (JSON), overriding the scene's
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Draw the background grid
    #[arg(short, long)]
    grid: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> AppResult<()> {
    let mut scene = Scene::load(&cli.scene)?;
    if let Some(path) = &cli.config {
        let config: ControllerConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        scene.config = config;
    }
    scene.show_grid |= cli.grid;

    log::info!(
        "Replaying {} ({} widgets, {} steps)",
        cli.scene.display(),
        scene.widgets.len(),
        scene.script.len()
    );
    let outcome = run_scene(&scene)?;
    export_svg(&scene, &outcome, &cli.output)?;
    log::info!(
        "{} connections, {} notifications, wrote {}",
        outcome.connections,
        outcome.events.len(),
        cli.output.display()
    );
    Ok(())
}
