//! Highwater CLI: one command per invocation against a data directory.
//!
//! ```text
//! highwater --db ./cells apply visits 7
//! highwater --db ./cells get visits
//! ```
//!
//! Logging goes to stderr, filtered by `HIGHWATER_LOG` (default `warn`).

mod commands;
mod format;
mod parse;

use std::process;

use highwater::Highwater;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_output, Output, OutputMode};
use parse::{matches_to_command, matches_to_options, CliCommand};

fn main() {
    init_logging();

    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let (options, command) = match matches_to_options(&matches)
        .and_then(|opts| matches_to_command(&matches).map(|cmd| (opts, cmd)))
    {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    let db = match options.builder().open() {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(1);
        }
    };
    debug!(?options, ?command, "running command");

    let exit_code = match execute(&db, command).and_then(|out| db.flush().map(|_| out)) {
        Ok(output) => {
            println!("{}", format_output(&output, output_mode));
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HIGHWATER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(db: &Highwater, command: CliCommand) -> highwater::Result<Output> {
    match command {
        CliCommand::Init { key } => {
            db.initialize(&key)?;
            let value = db.read(&key)?;
            Ok(Output::Value { key, value })
        }
        CliCommand::Get { key } => {
            let value = db.read(&key)?;
            Ok(Output::Value { key, value })
        }
        CliCommand::Apply { key, candidate } => {
            let value = db.apply_update(&key, candidate)?;
            Ok(Output::Value { key, value })
        }
        CliCommand::Stat { key } => {
            let record = db.snapshot(&key)?;
            Ok(Output::Record { key, record })
        }
    }
}
