use std::io;

use thiserror::Error;

use super::types::DialogueStage;

/// Transport-level failures while talking to a server. The probe folds these
/// into an `Undetermined` verdict; they never reach the caller as errors.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error during {stage}: {source}")]
    Io {
        stage: DialogueStage,
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("unexpected greeting {code}: {message}")]
    Greeting { code: u16, message: String },
    #[cfg(feature = "with-starttls")]
    #[error("TLS handshake failed: {source}")]
    Tls {
        #[source]
        source: native_tls::Error,
    },
    #[cfg(feature = "with-starttls")]
    #[error("STARTTLS rejected with {code}: {message}")]
    StartTlsRejected { code: u16, message: String },
}

impl ProbeError {
    /// Read timeouts surface as `WouldBlock` on some platforms.
    pub(crate) fn io(stage: DialogueStage, source: io::Error) -> Self {
        let source = if source.kind() == io::ErrorKind::WouldBlock {
            io::Error::new(io::ErrorKind::TimedOut, "operation timed out")
        } else {
            source
        };
        Self::Io { stage, source }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
