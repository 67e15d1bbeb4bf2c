//! `bulletin version`: the data version record.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::adapters::sqlite::SqliteVersionStore;
use crate::cli::commands::open_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Version};
use crate::domain::ports::VersionStore;

#[derive(Args, Debug)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionCommands,
}

#[derive(Subcommand, Debug)]
pub enum VersionCommands {
    /// Show the stored version
    Show,
    /// Store a new version
    Set {
        /// Version the data is at
        current: i64,
        /// Version the data is migrating to
        target: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct VersionOutput {
    pub version: Option<Version>,
    pub up_to_date: Option<bool>,
}

impl CommandOutput for VersionOutput {
    fn to_human(&self) -> String {
        match &self.version {
            Some(v) => format!(
                "Current version: {}\nTarget version:  {}{}",
                v.current_version,
                v.target_version,
                if v.is_current() { "" } else { "\n(migration pending)" }
            ),
            None => "No version stored.".to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl From<Option<Version>> for VersionOutput {
    fn from(version: Option<Version>) -> Self {
        Self {
            up_to_date: version.map(|v| v.is_current()),
            version,
        }
    }
}

pub async fn execute(args: VersionArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = open_database(config).await?;
    let store = SqliteVersionStore::new(pool);

    let version = match args.command {
        VersionCommands::Show => match store.version().await {
            Ok(version) => Some(version),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err).context("Failed to read version"),
        },
        VersionCommands::Set { current, target } => {
            let version = Version::new(current, target);
            store.set_version(&version).await.context("Failed to store version")?;
            Some(version)
        }
    };

    output(&VersionOutput::from(version), json_mode);
    Ok(())
}
