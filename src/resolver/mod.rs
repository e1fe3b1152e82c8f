//! Mail host discovery by guessing.
//!
//! No MX query is made: the bare domain, `mail.` and `smtp.` variants are tried
//! in that order and the first one that resolves is used. The strategy sits
//! behind [`HostResolver`] so a routing-aware implementation can replace it.

#[cfg(feature = "with-dns")]
mod dns;
mod lookup;
mod types;

#[cfg(feature = "with-dns")]
pub use dns::DnsLookup;
pub use lookup::{AddressLookup, SystemLookup};
pub use types::SmtpHost;

use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_PORT;

/// Picks the host the SMTP stage will talk to.
pub trait HostResolver {
    fn find_smtp_host(&self, domain: &str, port: u16, timeout: Duration) -> Option<SmtpHost>;
}

/// Ordered candidate hostnames for `domain`.
pub fn candidate_hosts(domain: &str) -> [String; 3] {
    [
        domain.to_string(),
        format!("mail.{domain}"),
        format!("smtp.{domain}"),
    ]
}

/// First-match-wins resolver over [`candidate_hosts`].
#[derive(Debug, Clone, Default)]
pub struct CandidateResolver<L = SystemLookup> {
    lookup: L,
}

impl<L: AddressLookup> CandidateResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

impl<L: AddressLookup> HostResolver for CandidateResolver<L> {
    fn find_smtp_host(&self, domain: &str, port: u16, timeout: Duration) -> Option<SmtpHost> {
        for host in candidate_hosts(domain) {
            debug!(host = %host, port, "trying candidate host");
            match self.lookup.lookup(&host, port, timeout) {
                Ok(addresses) if !addresses.is_empty() => {
                    debug!(host = %host, count = addresses.len(), "candidate host resolved");
                    return Some(SmtpHost::new(host, addresses));
                }
                Ok(_) => debug!(host = %host, "candidate host has no address"),
                Err(err) => debug!(host = %host, error = %err, "candidate host did not resolve"),
            }
        }
        None
    }
}

impl<T: HostResolver + ?Sized> HostResolver for &T {
    fn find_smtp_host(&self, domain: &str, port: u16, timeout: Duration) -> Option<SmtpHost> {
        (**self).find_smtp_host(domain, port, timeout)
    }
}

/// Candidate discovery on port 25 with the platform resolver.
pub fn find_smtp_host(domain: &str, timeout: Duration) -> Option<SmtpHost> {
    CandidateResolver::new(SystemLookup).find_smtp_host(domain, DEFAULT_PORT, timeout)
}

#[cfg(test)]
pub(crate) mod tests;
