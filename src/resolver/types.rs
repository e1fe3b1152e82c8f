use std::net::SocketAddr;

/// A candidate host that resolved, with the addresses the SMTP stage will use.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpHost {
    pub host: String,
    pub addresses: Vec<SocketAddr>,
}

impl SmtpHost {
    pub fn new(host: impl Into<String>, addresses: Vec<SocketAddr>) -> Self {
        Self {
            host: host.into(),
            addresses,
        }
    }
}
