use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use super::{AddressLookup, CandidateResolver, HostResolver, SmtpHost, candidate_hosts};

/// In-memory lookup table that also records the names it was asked for.
#[derive(Debug, Default)]
pub(crate) struct StubLookup {
    records: HashMap<String, Vec<SocketAddr>>,
    queried: Mutex<Vec<String>>,
}

impl StubLookup {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, host: &str, addr: SocketAddr) -> Self {
        self.records.entry(host.to_string()).or_default().push(addr);
        self
    }

    pub(crate) fn queried(&self) -> Vec<String> {
        self.queried.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl AddressLookup for StubLookup {
    fn lookup(&self, host: &str, port: u16, _timeout: Duration) -> io::Result<Vec<SocketAddr>> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(host.to_string());
        }
        match self.records.get(host) {
            // port 0 in the table means "whatever the caller asked for"
            Some(addrs) => Ok(addrs
                .iter()
                .map(|addr| match addr.port() {
                    0 => SocketAddr::new(addr.ip(), port),
                    _ => *addr,
                })
                .collect()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such host: {host}"),
            )),
        }
    }
}

fn addr(s: &str) -> SocketAddr {
    s.parse().expect("socket addr")
}

const TIMEOUT: Duration = Duration::from_secs(1);

#[test]
fn candidates_are_ordered() {
    assert_eq!(
        candidate_hosts("example.com"),
        [
            "example.com".to_string(),
            "mail.example.com".to_string(),
            "smtp.example.com".to_string(),
        ]
    );
}

#[test]
fn bare_domain_wins_when_everything_resolves() {
    let stub = StubLookup::new()
        .with("example.com", addr("192.0.2.1:0"))
        .with("mail.example.com", addr("192.0.2.2:0"))
        .with("smtp.example.com", addr("192.0.2.3:0"));
    let resolver = CandidateResolver::new(stub);

    let host = resolver
        .find_smtp_host("example.com", 25, TIMEOUT)
        .expect("bare domain resolves");
    assert_eq!(host, SmtpHost::new("example.com", vec![addr("192.0.2.1:25")]));
    assert_eq!(resolver.lookup.queried(), vec!["example.com"]);
}

#[test]
fn falls_through_to_smtp_prefix() {
    let stub = StubLookup::new().with("smtp.example.org", addr("192.0.2.9:0"));
    let resolver = CandidateResolver::new(stub);

    let host = resolver
        .find_smtp_host("example.org", 587, TIMEOUT)
        .expect("smtp. prefix resolves");
    assert_eq!(host.host, "smtp.example.org");
    assert_eq!(host.addresses, vec![addr("192.0.2.9:587")]);
    assert_eq!(
        resolver.lookup.queried(),
        vec!["example.org", "mail.example.org", "smtp.example.org"]
    );
}

#[test]
fn nothing_resolves() {
    let resolver = CandidateResolver::new(StubLookup::new());
    assert!(resolver.find_smtp_host("example.net", 25, TIMEOUT).is_none());
    assert_eq!(resolver.lookup.queried().len(), 3);
}
