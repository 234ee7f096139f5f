//! CLI command definitions and dispatch.

pub mod config;
pub mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use corral_common::config::CorralConfig;

/// Corral — in-process container orchestration kernel.
#[derive(Parser, Debug)]
#[command(name = "corral", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "CORRAL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sample WebServer/Database workload.
    Demo(demo::DemoArgs),
    /// Print the effective configuration as JSON.
    Config(config::ConfigArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Demo(args) => demo::execute(args, config),
        Command::Config(args) => config::execute(&args, &config),
    }
}

/// Loads the configuration file if one was given, defaults otherwise.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<CorralConfig> {
    let Some(path) = path else {
        return Ok(CorralConfig::default());
    };
    tracing::debug!(path = %path.display(), "loading configuration");
    CorralConfig::from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
}
