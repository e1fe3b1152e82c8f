use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Name-to-address primitive used by host discovery.
pub trait AddressLookup {
    fn lookup(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Vec<SocketAddr>>;
}

/// Platform resolver (`getaddrinfo` through [`ToSocketAddrs`]).
///
/// The platform call cannot be cancelled, so it runs on a helper thread and
/// the caller stops waiting once `timeout` expires. A late answer is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl AddressLookup for SystemLookup {
    fn lookup(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Vec<SocketAddr>> {
        let (tx, rx) = mpsc::channel();
        let query = (host.to_string(), port);
        thread::Builder::new()
            .name("mailprobe-lookup".to_string())
            .spawn(move || {
                let result = query.to_socket_addrs().map(|iter| iter.collect::<Vec<_>>());
                tx.send(result).ok();
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("resolving {host} timed out after {timeout:?}"),
            )),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::other(format!("lookup thread for {host} exited")))
            }
        }
    }
}
