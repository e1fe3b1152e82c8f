use std::fmt;

use thiserror::Error;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// An address that passed [`is_valid_syntax`](super::is_valid_syntax),
/// split on its last `@`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    local_part: String,
    domain: String,
}

impl EmailAddress {
    pub(crate) fn from_parts(local_part: &str, domain: &str) -> Self {
        Self {
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        }
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid email syntax: {}", reasons.join("; "))]
pub struct SyntaxError {
    pub reasons: Vec<String>,
}
