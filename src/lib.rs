//! Core library entry for the `tracklink` CLI.
//!
//! `tracklink` turns repository events (commits, pull requests, branches,
//! deployments, agent task updates, bug reports) into comments, status
//! transitions and links on the issue tracker work items they reference.

pub mod adapters;
pub mod agent;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod correlate;
pub mod dispatch;
pub mod event;
pub mod issue;
pub mod keys;
pub mod logging;
pub mod message;
pub mod ports;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    logging::init();
    commands::dispatch(&cli)
}
