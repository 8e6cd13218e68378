//! pgn-eco command line interface

use std::process::ExitCode;

use clap::Parser;
use pgn_eco::chess::{CancellationToken, log};
use pgn_eco::cli::Commands;

/// Streaming PGN toolkit: ECO classification, reformatting and move tokens.
///
/// Set `PGN_LOG` (`error`, `warn`, `info`, `debug`, `trace` or a full filter
/// directive) to control diagnostics on stderr.
#[derive(Parser)]
#[command(name = "pgn-eco")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    log::init();

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    match cli.command.execute(&cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            eprintln!("Error: {}", e);
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
