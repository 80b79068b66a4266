//! Console configuration, loaded from the environment and validated before
//! anything else runs.

use std::time::Duration;

use admin_api::{ClientSettings, ServerUrl};
use gateway::ConsoleError;

/// Admin API base used when `GWADMIN_SERVER_URL` is unset.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:4985/";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: usize = 20;

/// How log lines are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Validated console configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Admin API base URL.
    pub server: ServerUrl,
    /// Whole-request timeout; `None` disables it (needed for long longpolls).
    pub timeout: Option<Duration>,
    /// Documents per page for `docs`.
    pub page_size: usize,
    /// Log line format.
    pub log_format: LogFormat,
}

impl ConsoleConfig {
    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        let server_url = lookup("GWADMIN_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned());
        let server = ServerUrl::parse(&server_url)?;

        let timeout_secs = parse_number("GWADMIN_TIMEOUT_SECS", lookup("GWADMIN_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let page_size = parse_number("GWADMIN_PAGE_SIZE", lookup("GWADMIN_PAGE_SIZE"))?
            .unwrap_or(DEFAULT_PAGE_SIZE as u64);
        if page_size == 0 {
            return Err(ConsoleError::ConfigurationError {
                message: "GWADMIN_PAGE_SIZE must be at least 1".to_owned(),
            });
        }

        let log_format = match lookup("GWADMIN_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConsoleError::ConfigurationError {
                    message: format!("GWADMIN_LOG_FORMAT must be 'text' or 'json', got '{other}'"),
                })
            }
        };

        Ok(Self {
            server,
            timeout,
            page_size: usize::try_from(page_size).map_err(|_| ConsoleError::ConfigurationError {
                message: format!("GWADMIN_PAGE_SIZE is too large: {page_size}"),
            })?,
            log_format,
        })
    }

    /// HTTP client settings derived from this configuration.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: self.timeout,
            ..ClientSettings::default()
        }
    }
}

fn parse_number(key: &str, raw: Option<String>) -> Result<Option<u64>, ConsoleError> {
    raw.map(|value| {
        value.trim().parse().map_err(|_| ConsoleError::ConfigurationError {
            message: format!("{key} must be a non-negative integer, got '{value}'"),
        })
    })
    .transpose()
}
