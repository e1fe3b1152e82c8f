use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

#[cfg(feature = "with-starttls")]
use native_tls::{HandshakeError, TlsConnector, TlsStream};
use tracing::{debug, trace};

use super::error::ProbeError;
use super::types::{DialogueStage, SmtpEvent, SmtpReply};
use crate::resolver::SmtpHost;

/// RFC 5321 caps reply lines at 512 octets; leave room for sloppy servers.
const MAX_LINE: usize = 4096;

enum Stream {
    Plain(TcpStream),
    #[cfg(feature = "with-starttls")]
    Tls(Box<TlsStream<TcpStream>>),
    #[cfg(feature = "with-starttls")]
    Upgrading,
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            #[cfg(feature = "with-starttls")]
            Self::Tls(stream) => stream.read(buf),
            #[cfg(feature = "with-starttls")]
            Self::Upgrading => Err(io::Error::other("stream lost during TLS upgrade")),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            #[cfg(feature = "with-starttls")]
            Self::Tls(stream) => stream.write(buf),
            #[cfg(feature = "with-starttls")]
            Self::Upgrading => Err(io::Error::other("stream lost during TLS upgrade")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            #[cfg(feature = "with-starttls")]
            Self::Tls(stream) => stream.flush(),
            #[cfg(feature = "with-starttls")]
            Self::Upgrading => Ok(()),
        }
    }
}

/// One SMTP connection. The socket is owned here and shut down when the
/// session is dropped, whatever path the dialogue took.
pub(crate) struct SmtpSession {
    host: String,
    stream: Stream,
    buffer: Vec<u8>,
    transcript: Vec<SmtpEvent>,
}

impl SmtpSession {
    /// Tries each resolved address in turn; connect and all later reads and
    /// writes are bounded by `timeout`.
    pub(crate) fn connect(target: &SmtpHost, timeout: Duration) -> Result<Self, ProbeError> {
        let mut last_err = None;
        for addr in &target.addresses {
            debug!(host = %target.host, %addr, "connecting");
            match TcpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    let configured = stream
                        .set_read_timeout(Some(timeout))
                        .and_then(|()| stream.set_write_timeout(Some(timeout)));
                    if let Err(err) = configured {
                        last_err = Some(err);
                        continue;
                    }
                    return Ok(Self {
                        host: target.host.clone(),
                        stream: Stream::Plain(stream),
                        buffer: Vec::new(),
                        transcript: Vec::new(),
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(ProbeError::Connect {
            host: target.host.clone(),
            source: last_err.unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "no socket address available",
                )
            }),
        })
    }

    pub(crate) fn take_transcript(&mut self) -> Vec<SmtpEvent> {
        std::mem::take(&mut self.transcript)
    }

    /// Reads one (possibly multi-line) reply and records it.
    pub(crate) fn read_reply(&mut self, stage: DialogueStage) -> Result<SmtpReply, ProbeError> {
        let result = self.read_reply_inner(stage);
        self.record(stage, result)
    }

    /// Sends `command` and waits for its reply.
    pub(crate) fn command(
        &mut self,
        stage: DialogueStage,
        command: &str,
    ) -> Result<SmtpReply, ProbeError> {
        debug!(host = %self.host, %stage, command, "sending");
        self.transcript.push(SmtpEvent::Sent {
            stage,
            command: command.to_string(),
        });
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let written = self
            .stream
            .write_all(&line)
            .and_then(|()| self.stream.flush())
            .map_err(|err| ProbeError::io(stage, err));
        if let Err(err) = written {
            return self.record(stage, Err(err));
        }
        self.read_reply(stage)
    }

    /// Best-effort `QUIT`; the reply, if any, only lands in the transcript.
    pub(crate) fn quit(&mut self) {
        self.command(DialogueStage::Quit, "QUIT").ok();
    }

    #[cfg(feature = "with-starttls")]
    pub(crate) fn starttls(&mut self, connector: &TlsConnector) -> Result<(), ProbeError> {
        let reply = self.command(DialogueStage::StartTls, "STARTTLS")?;
        if reply.code != 220 {
            return Err(ProbeError::StartTlsRejected {
                code: reply.code,
                message: reply.message,
            });
        }
        if !self.buffer.is_empty() {
            return Err(ProbeError::protocol("unexpected data before TLS handshake"));
        }
        let plain = match std::mem::replace(&mut self.stream, Stream::Upgrading) {
            Stream::Plain(stream) => stream,
            other => {
                self.stream = other;
                return Err(ProbeError::protocol("TLS already negotiated"));
            }
        };
        let tls = complete_handshake(connector, &self.host, plain)?;
        self.stream = Stream::Tls(Box::new(tls));
        debug!(host = %self.host, "TLS established");
        Ok(())
    }

    fn record(
        &mut self,
        stage: DialogueStage,
        result: Result<SmtpReply, ProbeError>,
    ) -> Result<SmtpReply, ProbeError> {
        match &result {
            Ok(reply) => {
                debug!(host = %self.host, %stage, code = reply.code, "received");
                self.transcript.push(SmtpEvent::Received {
                    stage,
                    reply: reply.clone(),
                });
            }
            Err(err) => self.transcript.push(SmtpEvent::Error {
                stage,
                message: err.to_string(),
            }),
        }
        result
    }

    fn read_reply_inner(&mut self, stage: DialogueStage) -> Result<SmtpReply, ProbeError> {
        let mut code = None;
        let mut lines = Vec::new();
        loop {
            let raw = self.read_line(stage)?;
            let (parsed_code, continuation, text) = parse_reply_line(&raw)?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(ProbeError::protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            lines.push(text);
            if !continuation {
                break;
            }
        }
        let code = code.ok_or_else(|| ProbeError::protocol("reply missing status code"))?;
        Ok(SmtpReply::new(code, lines.join("\n")))
    }

    fn read_line(&mut self, stage: DialogueStage) -> Result<Vec<u8>, ProbeError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                trace!(line = %String::from_utf8_lossy(&line), "read");
                return Ok(line);
            }
            if self.buffer.len() > MAX_LINE {
                return Err(ProbeError::protocol("reply line too long"));
            }

            let mut chunk = [0u8; 512];
            let read = self
                .stream
                .read(&mut chunk)
                .map_err(|err| ProbeError::io(stage, err))?;
            if read == 0 {
                return Err(ProbeError::io(
                    stage,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by server"),
                ));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

impl Drop for SmtpSession {
    fn drop(&mut self) {
        match &mut self.stream {
            Stream::Plain(stream) => {
                stream.shutdown(Shutdown::Both).ok();
            }
            #[cfg(feature = "with-starttls")]
            Stream::Tls(stream) => {
                stream.shutdown().ok();
                stream.get_ref().shutdown(Shutdown::Both).ok();
            }
            #[cfg(feature = "with-starttls")]
            Stream::Upgrading => {}
        }
    }
}

/// Splits `250-text` / `250 text` / `250` into code, continuation flag, text.
pub(crate) fn parse_reply_line(raw: &[u8]) -> Result<(u16, bool, String), ProbeError> {
    let lossy = || String::from_utf8_lossy(raw).into_owned();
    if raw.len() < 3 || !raw[..3].iter().all(u8::is_ascii_digit) {
        return Err(ProbeError::protocol(format!("invalid reply: '{}'", lossy())));
    }
    let code = raw[..3]
        .iter()
        .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
    if !(200..=599).contains(&code) {
        return Err(ProbeError::protocol(format!(
            "reply code {code} out of range"
        )));
    }
    let continuation = match raw.get(3).copied() {
        None | Some(b' ') => false,
        Some(b'-') => true,
        Some(_) => {
            return Err(ProbeError::protocol(format!(
                "invalid reply separator: '{}'",
                lossy()
            )));
        }
    };
    // read_line already dropped the CRLF; the text is kept as sent
    let text = raw
        .get(4..)
        .map(|rest| String::from_utf8_lossy(rest).into_owned())
        .unwrap_or_default();
    Ok((code, continuation, text))
}

#[cfg(feature = "with-starttls")]
fn complete_handshake(
    connector: &TlsConnector,
    domain: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, ProbeError> {
    match connector.connect(domain, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(source)) => Err(ProbeError::Tls { source }),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(source)) => break Err(ProbeError::Tls { source }),
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}
