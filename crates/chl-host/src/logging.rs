use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use tracing_subscriber::filter::EnvFilter;

/// File to append logs to instead of stderr.
pub const LOG_PATH_ENV: &str = "CHALLENGES_LOG_PATH";

/// Initialize logging, writing to `CHALLENGES_LOG_PATH` if set, otherwise
/// stderr. `RUST_LOG` overrides the default `info` level. A log file that
/// cannot be opened is reported on stderr.
pub fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let path = std::env::var(LOG_PATH_ENV).ok();
    let file = path.as_deref().map(open_log_file);

    if let Some(Ok(file)) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let (Some(path), Some(Err(error))) = (path, file) {
        tracing::warn!(path = %path, %error, "could not open log file; logging to stderr");
    }
}

fn open_log_file(path: &str) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
