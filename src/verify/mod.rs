//! Syntax check, host discovery, SMTP dialogue; the first failing step ends
//! the verification.

mod types;

pub use types::{
    DeliverabilityResponse, REASON_INVALID_SYNTAX, REASON_NO_SMTP_HOST, VerificationResult,
    VerificationStage,
};

use std::time::Duration;

use tracing::{debug, info, info_span};

use crate::config::{ConfigError, ProbeOptions};
use crate::resolver::{CandidateResolver, HostResolver};
use crate::smtp::probe;
use crate::validator::EmailAddress;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stateless verifier. Holds validated options and a host resolver; every
/// call to [`verify`](Self::verify) is independent, so one instance can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Verifier<R = CandidateResolver> {
    resolver: R,
    options: ProbeOptions,
}

impl Verifier<CandidateResolver> {
    /// Verifier using the platform resolver and the candidate-host heuristic.
    pub fn new(options: ProbeOptions) -> Result<Self, ConfigError> {
        Self::with_resolver(CandidateResolver::default(), options)
    }
}

impl<R: HostResolver> Verifier<R> {
    pub fn with_resolver(resolver: R, options: ProbeOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { resolver, options })
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Blocks for the whole network exchange. Never fails: every outcome,
    /// including transport errors, is a [`VerificationResult`].
    pub fn verify(&self, email: &str) -> VerificationResult {
        let span = info_span!("verify", email);
        let _enter = span.enter();

        let address = match EmailAddress::parse(email) {
            Ok(address) => address,
            Err(err) => {
                debug!(reasons = ?err.reasons, "syntax check failed");
                return VerificationResult::rejected(
                    email,
                    VerificationStage::Syntax,
                    REASON_INVALID_SYNTAX,
                );
            }
        };

        let Some(host) = self.resolver.find_smtp_host(
            address.domain(),
            self.options.port,
            self.options.timeout,
        ) else {
            info!(domain = address.domain(), "no candidate host resolved");
            return VerificationResult::rejected(
                email,
                VerificationStage::HostDiscovery,
                REASON_NO_SMTP_HOST,
            );
        };
        info!(host = %host.host, "using SMTP host");

        let report = probe(&host, &address, &self.options);
        let result = VerificationResult::from_probe(email, host.host, report);
        info!(verdict = %result.verdict, reason = %result.reason, "verification finished");
        result
    }
}

/// One-shot verification with explicit options.
pub fn verify(email: &str, options: &ProbeOptions) -> Result<VerificationResult, ConfigError> {
    Ok(Verifier::new(options.clone())?.verify(email))
}

/// Entry point for request-handling layers: options come from the defaults
/// and the `MAILPROBE_*` environment, the timeout from the caller.
pub fn verify_email_deliverability(
    email: &str,
    timeout_seconds: u64,
) -> Result<DeliverabilityResponse, ConfigError> {
    let options = ProbeOptions::from_env()?.with_timeout(Duration::from_secs(timeout_seconds));
    Ok(Verifier::new(options)?.verify(email).into())
}
