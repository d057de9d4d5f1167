// Ledger Desk - Core Library
// Shared by the dashboard binary and the API server

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod shortcuts;
pub mod source;

#[cfg(feature = "remote")]
pub mod remote;

// Re-export commonly used types
pub use config::Config;
pub use db::{import_dir, load_csv, setup_database, verify_count, ImportCount, ImportSummary, SqliteStore};
pub use entities::{Company, Ledger, LedgerGroup, StockItem, Voucher, VoucherItem, VoucherType};
pub use error::{Error, Result};
pub use format::{
    format_currency, format_full_currency, format_magnitude, group_indian, FormatError, Formatter,
    Rounding,
};
pub use metrics::DashboardMetrics;
pub use shortcuts::{
    AltGCase, Binding, DispatchOptions, KeyBus, KeyPress, KeySource, ShortcutDispatcher, Shortcuts,
};
pub use source::{Fetch, RecordSource};

#[cfg(feature = "remote")]
pub use remote::RestSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the configured record source: the hosted backend when configured,
/// otherwise the local SQLite store.
pub fn open_source(config: &Config) -> Result<Box<dyn RecordSource + Send>> {
    if let Some(source) = remote_source(config)? {
        return Ok(source);
    }

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Box::new(SqliteStore::open(&config.db_path)?))
}

#[cfg(feature = "remote")]
fn remote_source(config: &Config) -> Result<Option<Box<dyn RecordSource + Send>>> {
    match (&config.remote_url, &config.remote_key) {
        (Some(url), Some(key)) => {
            tracing::info!(%url, "using hosted backend");
            Ok(Some(Box::new(RestSource::new(url.clone(), key.clone())?)))
        }
        _ => Ok(None),
    }
}

#[cfg(not(feature = "remote"))]
fn remote_source(config: &Config) -> Result<Option<Box<dyn RecordSource + Send>>> {
    if config.remote_url.is_some() {
        tracing::warn!("remote_url is set but this build lacks the `remote` feature; using SQLite");
    }
    Ok(None)
}
