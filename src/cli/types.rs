//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::actual_lrp::ActualLrpArgs;
use super::commands::converge::ConvergeArgs;
use super::commands::version::VersionArgs;

#[derive(Parser, Debug)]
#[command(name = "bulletin")]
#[command(about = "Bulletin - task and actual-LRP state store with convergence", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .bulletin/
    #[arg(short, long, global = true, env = "BULLETIN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one task convergence pass
    Converge(ConvergeArgs),

    /// Read actual-LRP groups
    #[command(name = "actual-lrp")]
    ActualLrp(ActualLrpArgs),

    /// Show or set the stored data version
    Version(VersionArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::actual_lrp::ActualLrpCommands;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_converge_cells() {
        let cli = Cli::parse_from([
            "bulletin", "converge", "--cell", "cell-a", "--cell", "cell-b,cell-c",
        ]);
        match cli.command {
            Commands::Converge(args) => assert_eq!(args.cells, vec!["cell-a", "cell-b", "cell-c"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_actual_lrp_show_with_global_json() {
        let cli = Cli::parse_from([
            "bulletin", "actual-lrp", "show", "proc-1", "--index", "2", "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::ActualLrp(args) => match args.command {
                ActualLrpCommands::Show { process_guid, index } => {
                    assert_eq!(process_guid, "proc-1");
                    assert_eq!(index, Some(2));
                }
                other => panic!("unexpected subcommand {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }
}
