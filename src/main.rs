//! Camera-view-bridge binary replaying a recorded framework session.

use std::path::PathBuf;

use camera_view_bridge::events::load_script;
use camera_view_bridge::logs::init_logging;
use camera_view_bridge::traits::Result;
use camera_view_bridge::{BridgeConfig, V4L2EngineFactory, ViewRegistry};
use clap::Parser;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(
    name = "camera-view-bridge",
    about = "Replay a recorded camera view session against V4L2 devices",
    version
)]
struct Cli {
    /// JSON array of view events (create, set, commit, destroy).
    script: PathBuf,

    /// Bridge configuration file; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };

    init_logging(&config.log)?;

    let events = load_script(&cli.script)?;
    let registry = ViewRegistry::new(V4L2EngineFactory::new(config.v4l2));

    for (idx, event) in events.iter().enumerate() {
        match registry.dispatch(event) {
            Ok(outcome) => println!("[{idx}] {}: {outcome:?}", event.node()),
            Err(err) => println!("[{idx}] {}: error: {err}", event.node()),
        }
    }

    for node in registry.nodes() {
        warn!(%node, "node never destroyed, engine still live");
    }
    println!("Live engines at end of script: {}", registry.len());
    Ok(())
}
