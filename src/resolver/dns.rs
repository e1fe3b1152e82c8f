use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};

use super::AddressLookup;

/// A/AAAA lookup through `trust-dns-resolver` (`with-dns` feature).
///
/// Unlike [`SystemLookup`](super::SystemLookup) the timeout is enforced by the
/// resolver itself. Only address records are queried, never MX.
///
/// Each synchronous resolver carries its own runtime, so the last one built
/// is cached and reused for as long as callers ask with the same timeout.
/// Clones share that cache.
#[derive(Clone)]
pub struct DnsLookup {
    config: ResolverConfig,
    opts: ResolverOpts,
    cached: Arc<Mutex<Option<(Duration, Arc<Resolver>)>>>,
}

impl DnsLookup {
    pub fn new(config: ResolverConfig, opts: ResolverOpts) -> Self {
        Self {
            config,
            opts,
            cached: Arc::default(),
        }
    }

    /// Reads `/etc/resolv.conf` (or the platform equivalent).
    pub fn from_system_conf() -> io::Result<Self> {
        let (config, opts) =
            trust_dns_resolver::system_conf::read_system_conf().map_err(io::Error::other)?;
        Ok(Self::new(config, opts))
    }

    fn resolver(&self, timeout: Duration) -> io::Result<Arc<Resolver>> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| io::Error::other("resolver cache lock poisoned"))?;
        if let Some((_, resolver)) = cached.as_ref().filter(|(built_for, _)| *built_for == timeout) {
            return Ok(Arc::clone(resolver));
        }
        let mut opts = self.opts.clone();
        opts.timeout = timeout;
        opts.attempts = 1;
        let resolver = Arc::new(Resolver::new(self.config.clone(), opts)?);
        *cached = Some((timeout, Arc::clone(&resolver)));
        Ok(resolver)
    }
}

impl fmt::Debug for DnsLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsLookup")
            .field("config", &self.config)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl AddressLookup for DnsLookup {
    fn lookup(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Vec<SocketAddr>> {
        let resolver = self.resolver(timeout)?;
        let lookup = resolver.lookup_ip(host).map_err(io::Error::other)?;
        Ok(lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect())
    }
}
