// Logging setup
//
// The TUI owns the terminal, so in that mode events go to a daily rolling
// file instead of stderr. Everything else logs to stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{Error, Result};

pub const LOG_FILE_PREFIX: &str = "ledger-desk.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Daily rolling file under `Config::log_dir`
    File,
}

/// RUST_LOG wins over the configured level
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(config: &Config, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.log_level);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Config(format!("logging already initialised: {}", e)))?;
            Ok(None)
        }
        LogTarget::File => {
            std::fs::create_dir_all(&config.log_dir)?;
            let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .map_err(|e| Error::Config(format!("logging already initialised: {}", e)))?;
            Ok(Some(guard))
        }
    }
}
