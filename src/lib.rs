#![forbid(unsafe_code)]
//! mailprobe_lib — best-effort email deliverability probe.
//!
//! Syntax check, candidate mail-host discovery, then a partial SMTP dialogue
//! (`HELO`, `MAIL FROM`, `RCPT TO`) that stops before any message is sent.

pub mod config;
pub mod resolver;
pub mod smtp;
pub mod validator;
pub mod verify;

pub use config::{ConfigError, ConfigFile, ProbeOptions};
#[cfg(feature = "with-dns")]
pub use resolver::DnsLookup;
pub use resolver::{
    AddressLookup, CandidateResolver, HostResolver, SmtpHost, SystemLookup, candidate_hosts,
    find_smtp_host,
};
pub use smtp::{DialogueStage, ProbeError, ProbeReport, SmtpEvent, SmtpReply, Verdict, probe};
pub use validator::{EmailAddress, SyntaxError, ValidationReport, is_valid_syntax, validate_syntax};
pub use verify::{
    DEFAULT_TIMEOUT_SECS, DeliverabilityResponse, VerificationResult, VerificationStage, Verifier,
    verify, verify_email_deliverability,
};
