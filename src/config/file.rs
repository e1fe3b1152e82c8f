//! On-disk TOML layout. Every field is optional; absent values keep whatever
//! the lower layer already set.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub smtp: SmtpSection,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SmtpSection {
    pub port: Option<u16>,
    pub helo_domain: Option<String>,
    pub mail_from: Option<String>,
    pub timeout_secs: Option<u64>,
    pub starttls: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
