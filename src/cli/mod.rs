//! Command-line interface for operators.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Configuration for this invocation: `--config <file>` or the project hierarchy.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Run the parsed command.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Converge(args) => commands::converge::execute(args, config, cli.json).await,
        Commands::ActualLrp(args) => commands::actual_lrp::execute(args, config, cli.json).await,
        Commands::Version(args) => commands::version::execute(args, config, cli.json).await,
    }
}

/// Report a failed command and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
