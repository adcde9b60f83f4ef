//! ArgMatches → CliCommand / open options.

use clap::ArgMatches;
use highwater::{DurabilityMode, HighwaterBuilder, ReadPolicy};
use std::path::PathBuf;

/// Data directory used when `--db` is absent.
pub const DEFAULT_DB_DIR: &str = ".highwater";

/// A single CLI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Init { key: String },
    Get { key: String },
    Apply { key: String, candidate: i64 },
    Stat { key: String },
}

/// How to open the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub path: PathBuf,
    pub durability: DurabilityMode,
    pub read_policy: ReadPolicy,
}

impl OpenOptions {
    /// Builder configured with these options.
    pub fn builder(&self) -> HighwaterBuilder {
        highwater::Highwater::builder()
            .path(&self.path)
            .durability(self.durability)
            .read_policy(self.read_policy)
    }
}

/// Read the global flags.
pub fn matches_to_options(matches: &ArgMatches) -> Result<OpenOptions, String> {
    let path = matches
        .get_one::<String>("db")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_DIR));

    let durability = match matches.get_one::<String>("durability") {
        Some(mode) => mode.parse::<DurabilityMode>()?,
        None => DurabilityMode::default(),
    };

    let read_policy = if matches.get_flag("auto-default") {
        ReadPolicy::AutoDefault
    } else {
        ReadPolicy::RequireInitialized
    };

    Ok(OpenOptions {
        path,
        durability,
        read_policy,
    })
}

/// Convert the subcommand into a CliCommand.
pub fn matches_to_command(matches: &ArgMatches) -> Result<CliCommand, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    let key = m
        .get_one::<String>("key")
        .cloned()
        .ok_or_else(|| format!("{}: missing key", sub_name))?;

    match sub_name {
        "init" => Ok(CliCommand::Init { key }),
        "get" => Ok(CliCommand::Get { key }),
        "apply" => {
            let candidate = *m
                .get_one::<i64>("candidate")
                .ok_or("apply: missing candidate")?;
            Ok(CliCommand::Apply { key, candidate })
        }
        "stat" => Ok(CliCommand::Stat { key }),
        other => Err(format!("Unknown command: {}", other)),
    }
}
