use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CSM_LOG";

/// Filter directive for the given verbosity; `-v` flags beat the configured
/// level.
pub fn level_for(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber. `CSM_LOG` overrides everything; logs go
/// to `log_file` when set (appended, no colours), otherwise to stderr.
pub fn init(verbosity: u8, configured: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, configured)));

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("Cannot open log file {}: {}", path.display(), e))
            .ok()
    });

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    };
}
