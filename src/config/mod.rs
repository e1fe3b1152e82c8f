//! Probe configuration: defaults, TOML file, environment, in that order.

mod error;
mod file;

pub use error::ConfigError;
pub use file::{ConfigFile, SmtpSection};

use std::time::Duration;

use crate::validator::is_valid_syntax;

pub const DEFAULT_PORT: u16 = 25;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HELO_DOMAIN: &str = "localhost";
pub const DEFAULT_MAIL_FROM: &str = "postmaster@localhost.localdomain";

pub const ENV_PORT: &str = "MAILPROBE_PORT";
pub const ENV_HELO: &str = "MAILPROBE_HELO";
pub const ENV_MAIL_FROM: &str = "MAILPROBE_MAIL_FROM";
pub const ENV_TIMEOUT_SECS: &str = "MAILPROBE_TIMEOUT_SECS";
pub const ENV_STARTTLS: &str = "MAILPROBE_STARTTLS";

/// Controls how [`Verifier`](crate::Verifier) talks to remote servers.
///
/// `helo_domain` and `mail_from` are fixed identities, never derived from the
/// address under test. Remote servers react to them, so deployments should
/// set their own.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub port: u16,
    pub helo_domain: String,
    pub mail_from: String,
    /// Applied to name resolution, connect, and every read/write.
    pub timeout: Duration,
    pub starttls: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            helo_domain: DEFAULT_HELO_DOMAIN.to_string(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            timeout: DEFAULT_TIMEOUT,
            starttls: false,
        }
    }
}

impl ProbeOptions {
    /// Defaults overlaid with the `MAILPROBE_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        options.apply_env()?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn apply_file(&mut self, file: &ConfigFile) {
        let smtp = &file.smtp;
        if let Some(port) = smtp.port {
            self.port = port;
        }
        if let Some(helo) = &smtp.helo_domain {
            self.helo_domain = helo.clone();
        }
        if let Some(from) = &smtp.mail_from {
            self.mail_from = from.clone();
        }
        if let Some(secs) = smtp.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(starttls) = smtp.starttls {
            self.starttls = starttls;
        }
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`apply_env`](Self::apply_env) with an arbitrary variable source.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PORT) {
            self.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env(ENV_PORT, raw.as_str()))?;
        }
        if let Some(helo) = lookup(ENV_HELO) {
            self.helo_domain = helo;
        }
        if let Some(from) = lookup(ENV_MAIL_FROM) {
            self.mail_from = from;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env(ENV_TIMEOUT_SECS, raw.as_str()))?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_STARTTLS) {
            self.starttls = parse_flag(&raw)
                .ok_or_else(|| ConfigError::invalid_env(ENV_STARTTLS, raw.as_str()))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.helo_domain.trim().is_empty() {
            return Err(ConfigError::EmptyHelo);
        }
        if !is_helo_identity(&self.helo_domain) {
            return Err(ConfigError::InvalidHelo(self.helo_domain.clone()));
        }
        if !is_valid_syntax(&self.mail_from) {
            return Err(ConfigError::InvalidSender(self.mail_from.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.starttls && !cfg!(feature = "with-starttls") {
            return Err(ConfigError::StartTlsUnavailable);
        }
        Ok(())
    }
}

/// Dot-separated `[A-Za-z0-9-]` labels (`localhost` included) or a bracketed
/// address literal; never whitespace or line breaks.
fn is_helo_identity(helo: &str) -> bool {
    if let Some(literal) = helo.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return !literal.is_empty()
            && literal
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':'));
    }
    helo.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let options = ProbeOptions::default();
        options.validate().expect("defaults validate");
        assert_eq!(options.port, 25);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn file_overrides_defaults() {
        let file: ConfigFile =
            toml::from_str("[smtp]\nmail_from = \"probe@example.net\"\ntimeout_secs = 4\n")
                .expect("toml");
        let mut options = ProbeOptions::default();
        options.apply_file(&file);
        assert_eq!(options.mail_from, "probe@example.net");
        assert_eq!(options.timeout, Duration::from_secs(4));
        assert_eq!(options.helo_domain, DEFAULT_HELO_DOMAIN);
    }

    #[test]
    fn env_overrides_file() {
        let file: ConfigFile = toml::from_str("[smtp]\nport = 2525\n").expect("toml");
        let mut options = ProbeOptions::default();
        options.apply_file(&file);
        options
            .apply_env_with(env(&[(ENV_PORT, "587"), (ENV_HELO, "probe.example.net")]))
            .expect("env applies");
        assert_eq!(options.port, 587);
        assert_eq!(options.helo_domain, "probe.example.net");
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut options = ProbeOptions::default();
        let err = options
            .apply_env_with(env(&[(ENV_TIMEOUT_SECS, "soon")]))
            .expect_err("not a number");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: ENV_TIMEOUT_SECS,
                ..
            }
        ));
    }

    #[test]
    fn starttls_flag_parsing() {
        let mut options = ProbeOptions::default();
        options
            .apply_env_with(env(&[(ENV_STARTTLS, "Yes")]))
            .expect("flag");
        assert!(options.starttls);
        assert!(
            options
                .apply_env_with(env(&[(ENV_STARTTLS, "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn validate_rejects_broken_options() {
        let bad_sender = ProbeOptions {
            mail_from: "not-an-address".to_string(),
            ..ProbeOptions::default()
        };
        assert!(matches!(
            bad_sender.validate(),
            Err(ConfigError::InvalidSender(_))
        ));

        let zero = ProbeOptions::default().with_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTimeout)));

        let helo = ProbeOptions {
            helo_domain: "  ".to_string(),
            ..ProbeOptions::default()
        };
        assert!(matches!(helo.validate(), Err(ConfigError::EmptyHelo)));

        for injected in [
            "probe.example.net\r\nRSET",
            "probe.example.net\n",
            "probe example.net",
            "probe..example.net",
            "[]",
        ] {
            let helo = ProbeOptions {
                helo_domain: injected.to_string(),
                ..ProbeOptions::default()
            };
            assert!(
                matches!(helo.validate(), Err(ConfigError::InvalidHelo(_))),
                "{injected:?} accepted"
            );
        }

        let port = ProbeOptions {
            port: 0,
            ..ProbeOptions::default()
        };
        assert!(matches!(port.validate(), Err(ConfigError::ZeroPort)));
    }

    #[test]
    fn helo_accepts_host_names_and_literals() {
        for helo in [
            "localhost",
            "probe.example.net",
            "mx-1.example.org",
            "[192.0.2.7]",
            "[IPv6:2001:db8::1]",
        ] {
            let options = ProbeOptions {
                helo_domain: helo.to_string(),
                ..ProbeOptions::default()
            };
            assert!(options.validate().is_ok(), "{helo} rejected");
        }
    }

    #[test]
    fn env_helo_with_line_break_fails_validation() {
        let mut options = ProbeOptions::default();
        options
            .apply_env_with(env(&[(ENV_HELO, "probe.example.net\r\nRSET")]))
            .expect("raw value is taken as is");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidHelo(_))
        ));
    }

    #[cfg(not(feature = "with-starttls"))]
    #[test]
    fn starttls_needs_feature() {
        let options = ProbeOptions {
            starttls: true,
            ..ProbeOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::StartTlsUnavailable)
        ));
    }
}
