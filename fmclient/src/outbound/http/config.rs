//! Connection settings loaded via OrthoConfig.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::ErrorKind;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "fmclient";

/// Settings that are missing or cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A required setting has no value.
    #[error("setting \"{name}\" is required")]
    Missing {
        /// Setting name.
        name: &'static str,
    },
    /// A setting has a value that cannot be used.
    #[error("setting \"{name}\" is invalid: {message}")]
    Invalid {
        /// Setting name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl SettingsError {
    /// Settings problems are configuration errors.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Where and how to reach the database server.
///
/// Read from `FILEMAKER_*` environment variables, configuration files, and
/// command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FILEMAKER")]
pub struct ConnectionSettings {
    /// Server base URI; user-info, when present, supplies default credentials.
    pub uri: Option<String>,
    /// Database name sent as `-db`.
    pub database: Option<String>,
    /// IANA zone the server reports timestamps in.
    pub server_time_zone: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// User-agent header value.
    pub user_agent: Option<String>,
}

impl ConnectionSettings {
    /// Parsed server base URI.
    ///
    /// # Errors
    ///
    /// Fails when the URI is missing or not an absolute URL.
    pub fn base_uri(&self) -> Result<Url, SettingsError> {
        let raw = self
            .uri
            .as_deref()
            .ok_or(SettingsError::Missing { name: "uri" })?;
        Url::parse(raw).map_err(|error| SettingsError::Invalid {
            name: "uri",
            message: error.to_string(),
        })
    }

    /// Database name.
    ///
    /// # Errors
    ///
    /// Fails when no database is configured.
    pub fn database(&self) -> Result<&str, SettingsError> {
        self.database
            .as_deref()
            .filter(|database| !database.is_empty())
            .ok_or(SettingsError::Missing { name: "database" })
    }

    /// Server time zone, defaulting to UTC.
    ///
    /// # Errors
    ///
    /// Fails when the configured name is not an IANA zone.
    pub fn server_time_zone(&self) -> Result<Tz, SettingsError> {
        self.server_time_zone
            .as_deref()
            .map_or(Ok(Tz::UTC), |name| {
                Tz::from_str(name).map_err(|error| SettingsError::Invalid {
                    name: "server_time_zone",
                    message: error.to_string(),
                })
            })
    }

    /// Request timeout, defaulting to 30 seconds.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(match self.timeout_seconds {
            Some(seconds) => seconds,
            None => DEFAULT_TIMEOUT_SECONDS,
        })
    }

    /// User-agent header value, defaulting to `fmclient`.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}
