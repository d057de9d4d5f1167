//! Configuration for the dashboard and the API server
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/ledger-desk/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::format::{Formatter, Rounding, DEFAULT_PREFIX};
use crate::shortcuts::{AltGCase, DispatchOptions};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Local SQLite copy of the books
    pub db_path: PathBuf,

    /// Company shown on startup; the first company when unset
    pub company_id: Option<String>,

    pub currency_symbol: String,

    pub rounding: Rounding,

    pub alt_g_case: AltGCase,

    pub broad_function_keys: bool,

    /// Directory for rolling log files (TUI mode)
    pub log_dir: PathBuf,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,

    /// API server address
    pub bind_addr: SocketAddr,

    /// Hosted backend; when set the dashboard reads from it instead of SQLite
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let options = DispatchOptions::default();
        Self {
            db_path: default_data_dir().join("books.db"),
            company_id: None,
            currency_symbol: DEFAULT_PREFIX.to_string(),
            rounding: Rounding::default(),
            alt_g_case: options.alt_g_case,
            broad_function_keys: options.broad_function_keys,
            log_dir: default_data_dir().join("logs"),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            remote_url: None,
            remote_key: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("ledger-desk"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Config file structure; every key optional
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub db_path: Option<String>,
    pub company_id: Option<String>,
    pub currency_symbol: Option<String>,
    pub rounding: Option<Rounding>,
    pub alt_g_case: Option<AltGCase>,
    pub broad_function_keys: Option<bool>,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
    pub bind_addr: Option<String>,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
}

impl Config {
    /// ~/.config/ledger-desk/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("ledger-desk").join("config.toml"))
    }

    /// Write the default template unless a config file already exists.
    /// Returns the path when a file was written.
    pub fn ensure_config_exists() -> Result<Option<PathBuf>> {
        let Some(path) = Self::config_path() else {
            return Ok(None);
        };
        if path.exists() {
            return Ok(None);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Self::default().to_toml())?;
        Ok(Some(path))
    }

    /// Load configuration: env -> file -> defaults
    pub fn load() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) => Self::read_file(&path)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    fn read_file(path: &std::path::Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(Error::Config(format!("cannot read {}: {}", path.display(), e))),
        }
    }

    pub(crate) fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let db_path = env("LEDGER_DESK_DB")
            .or(file.db_path)
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let company_id = env("LEDGER_DESK_COMPANY").or(file.company_id);

        let log_dir = env("LEDGER_DESK_LOG_DIR")
            .or(file.log_dir)
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        let bind_addr = match env("LEDGER_DESK_BIND").or(file.bind_addr) {
            Some(addr) => addr
                .parse()
                .map_err(|e| Error::Config(format!("invalid bind address '{}': {}", addr, e)))?,
            None => defaults.bind_addr,
        };

        let remote_url = env("LEDGER_DESK_REMOTE_URL").or(file.remote_url);
        let remote_key = env("LEDGER_DESK_REMOTE_KEY").or(file.remote_key);
        if remote_url.is_some() && remote_key.is_none() {
            return Err(Error::Config("remote_url is set but remote_key is missing".to_string()));
        }

        Ok(Self {
            db_path,
            company_id,
            currency_symbol: file.currency_symbol.unwrap_or(defaults.currency_symbol),
            rounding: file.rounding.unwrap_or(defaults.rounding),
            alt_g_case: file.alt_g_case.unwrap_or(defaults.alt_g_case),
            broad_function_keys: file.broad_function_keys.unwrap_or(defaults.broad_function_keys),
            log_dir,
            log_level: file.log_level.unwrap_or(defaults.log_level),
            bind_addr,
            remote_url,
            remote_key,
        })
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.currency_symbol.clone()).with_rounding(self.rounding)
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            alt_g_case: self.alt_g_case,
            broad_function_keys: self.broad_function_keys,
        }
    }

    /// Commented template for a fresh config file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# Ledger Desk configuration

# Local SQLite copy of the books
db_path = "{db_path}"

# Company shown on startup (first company when unset)
# company_id = ""

currency_symbol = "{symbol}"

# Rounding for abbreviated amounts: "half-up" or "half-even"
rounding = "{rounding}"

# Alt+G matching: "verbatim" (suppress on G, dispatch on g) or "either"
alt_g_case = "{alt_g_case}"

# Swallow every F-prefixed key, not only F1-F9
broad_function_keys = {broad}

log_dir = "{log_dir}"
log_level = "{log_level}"
bind_addr = "{bind}"

# Hosted backend (PostgREST-style)
# remote_url = "https://example.supabase.co"
# remote_key = ""
"#,
            db_path = self.db_path.display(),
            symbol = self.currency_symbol,
            rounding = self.rounding,
            alt_g_case = self.alt_g_case,
            broad = self.broad_function_keys,
            log_dir = self.log_dir.display(),
            log_level = self.log_level,
            bind = self.bind_addr,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(FileConfig::default(), no_env).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.currency_symbol, "₹");
        assert_eq!(config.rounding, Rounding::HalfUp);
        assert_eq!(config.dispatch_options(), DispatchOptions::default());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_file_overrides() {
        let file: FileConfig = toml::from_str(
            r#"
            db_path = "/tmp/books.db"
            currency_symbol = "Rs. "
            rounding = "half-even"
            alt_g_case = "either"
            broad_function_keys = false
            "#,
        )
        .unwrap();

        let config = Config::from_sources(file, no_env).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/books.db"));
        assert_eq!(config.rounding, Rounding::HalfEven);
        assert_eq!(config.alt_g_case, AltGCase::Either);
        assert!(!config.broad_function_keys);
        assert_eq!(config.formatter().format(12_250_000.0), "Rs. 1.22 Cr");
    }

    #[test]
    fn test_env_beats_file() {
        let file = FileConfig {
            db_path: Some("/from/file.db".to_string()),
            company_id: Some("file-co".to_string()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            ("LEDGER_DESK_DB", "/from/env.db"),
            ("LEDGER_DESK_BIND", "0.0.0.0:8080"),
        ]);

        let config = Config::from_sources(file, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/from/env.db"));
        assert_eq!(config.company_id.as_deref(), Some("file-co"));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_invalid_values() {
        let bad_bind = FileConfig {
            bind_addr: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(matches!(Config::from_sources(bad_bind, no_env), Err(Error::Config(_))));

        let missing_key = FileConfig {
            remote_url: Some("https://books.example.com".to_string()),
            ..Default::default()
        };
        assert!(Config::from_sources(missing_key, no_env).is_err());

        assert!(toml::from_str::<FileConfig>("rounding = \"bankers\"").is_err());
        assert!(toml::from_str::<FileConfig>("unknown_key = 1").is_err());
    }

    #[test]
    fn test_template_parses() {
        let template = Config::default().to_toml();
        let file: FileConfig = toml::from_str(&template).unwrap();
        assert_eq!(file.rounding, Some(Rounding::HalfUp));
        assert_eq!(file.alt_g_case, Some(AltGCase::Verbatim));
        assert_eq!(file.broad_function_keys, Some(true));
    }

    #[test]
    fn test_template_keeps_current_values() {
        let config = Config {
            rounding: Rounding::HalfEven,
            alt_g_case: AltGCase::Either,
            broad_function_keys: false,
            ..Config::default()
        };
        let file: FileConfig = toml::from_str(&config.to_toml()).unwrap();
        let reloaded = Config::from_sources(file, no_env).unwrap();
        assert_eq!(reloaded.alt_g_case, AltGCase::Either);
        assert_eq!(reloaded.dispatch_options(), config.dispatch_options());
        assert_eq!(reloaded.rounding, Rounding::HalfEven);
    }
}
