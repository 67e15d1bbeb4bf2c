//! `bulletin actual-lrp`: read actual-LRP groups.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::adapters::sqlite::SqliteTreeStore;
use crate::cli::commands::open_database;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{ActualLRP, ActualLRPFilter, ActualLRPGroup, Config};
use crate::services::{ActualLrpReader, WorkPool};

#[derive(Args, Debug)]
pub struct ActualLrpArgs {
    #[command(subcommand)]
    pub command: ActualLrpCommands,
}

#[derive(Subcommand, Debug)]
pub enum ActualLrpCommands {
    /// List every group, optionally filtered
    List {
        /// Only records in this domain
        #[arg(short, long, default_value = "")]
        domain: String,
        /// Only records placed on this cell
        #[arg(long, default_value = "")]
        cell_id: String,
    },
    /// Show the groups of one process, or a single slot with --index
    Show {
        /// Process guid
        process_guid: String,
        /// Instance index
        #[arg(short, long)]
        index: Option<i32>,
    },
}

#[derive(Debug, Serialize)]
pub struct ActualLrpGroupsOutput {
    pub groups: Vec<ActualLRPGroup>,
    pub total: usize,
}

impl CommandOutput for ActualLrpGroupsOutput {
    fn to_human(&self) -> String {
        if self.groups.is_empty() {
            return "No actual LRPs found.".to_string();
        }

        let mut lines = vec![format!("Found {} actual LRP group(s):\n", self.total)];
        lines.push(format!(
            "{:<36} {:>5} {:<10} {:<11} {:<16} {:<12}",
            "PROCESS GUID", "INDEX", "SIDE", "STATE", "CELL", "DOMAIN"
        ));
        lines.push("-".repeat(95));

        for group in &self.groups {
            for (side, lrp) in sides(group) {
                lines.push(format!(
                    "{:<36} {:>5} {:<10} {:<11} {:<16} {:<12}",
                    truncate(&lrp.process_guid, 36),
                    lrp.index,
                    side,
                    lrp.state.as_str(),
                    truncate(&lrp.cell_id, 16),
                    truncate(&lrp.domain, 12),
                ));
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ActualLrpGroupOutput {
    pub group: ActualLRPGroup,
}

impl CommandOutput for ActualLrpGroupOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for (side, lrp) in sides(&self.group) {
            lines.push(format!("{side}:"));
            lines.push(format!("  Process GUID:  {}", lrp.process_guid));
            lines.push(format!("  Index:         {}", lrp.index));
            lines.push(format!("  Domain:        {}", lrp.domain));
            lines.push(format!("  Instance GUID: {}", lrp.instance_guid));
            lines.push(format!("  Cell:          {}", lrp.cell_id));
            lines.push(format!("  State:         {}", lrp.state.as_str()));
            lines.push(format!("  Crash count:   {}", lrp.crash_count));
            if !lrp.placement_error.is_empty() {
                lines.push(format!("  Placement err: {}", lrp.placement_error));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn sides(group: &ActualLRPGroup) -> impl Iterator<Item = (&'static str, &ActualLRP)> {
    group
        .instance
        .iter()
        .map(|lrp| ("instance", lrp))
        .chain(group.evacuating.iter().map(|lrp| ("evacuating", lrp)))
}

pub async fn execute(args: ActualLrpArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = open_database(config).await?;
    let work_pool = WorkPool::new(config.actual_lrp.max_workers)?;
    let reader = ActualLrpReader::new(Arc::new(SqliteTreeStore::new(pool)), work_pool);

    match args.command {
        ActualLrpCommands::List { domain, cell_id } => {
            let groups = reader
                .all_groups(&ActualLRPFilter::new(domain, cell_id))
                .await
                .context("Failed to read actual LRP groups")?;
            let total = groups.len();
            output(&ActualLrpGroupsOutput { groups, total }, json_mode);
        }

        ActualLrpCommands::Show {
            process_guid,
            index: Some(index),
        } => {
            let group = reader
                .group_by_process_guid_and_index(&process_guid, index)
                .await
                .with_context(|| format!("No actual LRP {process_guid} at index {index}"))?;
            output(&ActualLrpGroupOutput { group }, json_mode);
        }

        ActualLrpCommands::Show {
            process_guid,
            index: None,
        } => {
            let groups = reader
                .groups_by_process_guid(&process_guid)
                .await
                .with_context(|| format!("Failed to read actual LRPs of {process_guid}"))?;
            let total = groups.len();
            output(&ActualLrpGroupsOutput { groups, total }, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ActualLRPState;

    fn lrp(cell_id: &str) -> ActualLRP {
        ActualLRP {
            process_guid: "proc-1".to_string(),
            index: 0,
            domain: "cf-apps".to_string(),
            instance_guid: "ig-1".to_string(),
            cell_id: cell_id.to_string(),
            state: ActualLRPState::Running,
            since: 0,
            crash_count: 0,
            placement_error: String::new(),
        }
    }

    #[test]
    fn test_list_output_renders_both_sides() {
        let out = ActualLrpGroupsOutput {
            groups: vec![ActualLRPGroup {
                instance: Some(lrp("cell-new")),
                evacuating: Some(lrp("cell-old")),
            }],
            total: 1,
        };

        let human = out.to_human();
        assert!(human.contains("instance"));
        assert!(human.contains("evacuating"));
        assert!(human.contains("cell-old"));
        assert_eq!(out.to_json()["groups"][0]["instance"]["state"], "RUNNING");
    }

    #[test]
    fn test_empty_list_output() {
        let out = ActualLrpGroupsOutput {
            groups: vec![],
            total: 0,
        };
        assert_eq!(out.to_human(), "No actual LRPs found.");
    }
}
