use std::env;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PGN_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Maps the short level names accepted in `PGN_LOG` onto filter directives.
/// Anything else is handed to `EnvFilter` verbatim (e.g. `pgn_eco=debug`).
fn directive_from_str(s: &str) -> String {
    match s.trim().to_lowercase().as_str() {
        "" => DEFAULT_DIRECTIVE.to_string(),
        "error" | "err" => "error".to_string(),
        "warn" | "warning" => "warn".to_string(),
        "info" => "info".to_string(),
        "debug" => "debug".to_string(),
        "trace" => "trace".to_string(),
        "off" | "none" => "off".to_string(),
        _ => s.trim().to_string(),
    }
}

fn filter_from_env() -> EnvFilter {
    let directive = env::var(LOG_ENV)
        .map(|s| directive_from_str(&s))
        .unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_string());

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the stderr subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
