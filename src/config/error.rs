use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing configuration. Unlike verification outcomes, these are
/// surfaced to the caller as hard errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("helo_domain must not be empty")]
    EmptyHelo,
    #[error("helo_domain {0:?} is not a host name or address literal")]
    InvalidHelo(String),
    #[error("mail_from '{0}' is not a valid address")]
    InvalidSender(String),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("port must be greater than zero")]
    ZeroPort,
    #[error("starttls requested but the `with-starttls` feature is disabled")]
    StartTlsUnavailable,
    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_env(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnv {
            key,
            value: value.into(),
        }
    }
}
