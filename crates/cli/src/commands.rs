//! clap command tree.

use clap::{Arg, ArgAction, Command};

/// Build the top-level `highwater` command.
pub fn build_cli() -> Command {
    Command::new("highwater")
        .about("Monotonic counter cells backed by a write-ahead log")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("DIR")
                .global(true)
                .help("Data directory [default: .highwater]"),
        )
        .arg(
            Arg::new("durability")
                .long("durability")
                .value_name("MODE")
                .global(true)
                .value_parser(["none", "strict", "batched"])
                .help("Fsync policy [default: batched]"),
        )
        .arg(
            Arg::new("auto-default")
                .long("auto-default")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Reads of unknown keys create them and return 0"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of plain text"),
        )
        .subcommand(
            Command::new("init")
                .about("Create a cell with value 0 if it does not exist")
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("get")
                .about("Print the value of a cell")
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("apply")
                .about("Merge a candidate into a cell and print the result")
                .arg(key_arg())
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(i64))
                        .help("Candidate value"),
                ),
        )
        .subcommand(
            Command::new("stat")
                .about("Print value, version and last update time of a cell")
                .arg(key_arg()),
        )
}

fn key_arg() -> Arg {
    Arg::new("key").required(true).help("Cell key")
}
