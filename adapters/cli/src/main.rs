#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless row-match session.

mod collaborators;
mod simulation;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rowmatch_engine::EngineConfig;

use crate::simulation::{Settings, Simulation};

/// Command-line options for the headless simulation.
#[derive(Debug, Parser)]
#[command(
    name = "rowmatch",
    about = "Plays a headless row-match session with a random player",
    version
)]
struct Cli {
    /// TOML file with engine settings. Built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed shared by the item spawner and the simulated player.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Number of exchanges the player attempts.
    #[arg(long, default_value_t = 200)]
    moves: u32,

    /// Upper bound on simulated frames.
    #[arg(long = "max-frames", default_value_t = 20_000)]
    max_frames: u32,
}

/// Entry point for the row-match command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    log::info!(
        "starting a {}x{} session with seed {}",
        config.grid.columns,
        config.grid.rows,
        cli.seed
    );

    let settings = Settings {
        seed: cli.seed,
        moves: cli.moves,
        max_frames: cli.max_frames,
    };
    let summary = Simulation::new(config, settings.seed).run(&settings);
    println!("{summary}");
    Ok(())
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    EngineConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "rowmatch",
            "--seed",
            "3",
            "--moves",
            "10",
            "--max-frames",
            "99",
            "--config",
            "level.toml",
        ])
        .expect("valid arguments");

        assert_eq!(cli.seed, 3);
        assert_eq!(cli.moves, 10);
        assert_eq!(cli.max_frames, 99);
        assert_eq!(cli.config, Some(PathBuf::from("level.toml")));
    }

    #[test]
    fn missing_config_file_reports_its_path() {
        let error = load_config(Path::new("does/not/exist.toml")).expect_err("file is missing");
        assert!(format!("{error:#}").contains("does/not/exist.toml"));
    }
}
