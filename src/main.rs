//! Binary entrypoint for the `tracklink` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Recording and replay are selected in commands::dispatch via
    // TRACKLINK_RECORD=<dir> and TRACKLINK_REPLAY=<file>.
    match tracklink::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
