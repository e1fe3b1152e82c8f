use std::fmt;

use crate::smtp::{ProbeReport, SmtpEvent, SmtpReply, Verdict};

pub const REASON_INVALID_SYNTAX: &str = "Invalid email syntax";
pub const REASON_NO_SMTP_HOST: &str = "Could not find an SMTP server for this domain";

/// Which step produced the verdict.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStage {
    Syntax,
    HostDiscovery,
    Smtp,
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::HostDiscovery => "host discovery",
            Self::Smtp => "smtp",
        })
    }
}

/// Full outcome of one verification.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub email: String,
    pub verdict: Verdict,
    pub reason: String,
    pub stage: VerificationStage,
    pub host: Option<String>,
    pub reply: Option<SmtpReply>,
    pub transcript: Vec<SmtpEvent>,
}

impl VerificationResult {
    pub(crate) fn rejected(email: &str, stage: VerificationStage, reason: &str) -> Self {
        Self {
            email: email.to_string(),
            verdict: Verdict::NotDeliverable,
            reason: reason.to_string(),
            stage,
            host: None,
            reply: None,
            transcript: Vec::new(),
        }
    }

    pub(crate) fn from_probe(email: &str, host: String, report: ProbeReport) -> Self {
        Self {
            email: email.to_string(),
            verdict: report.verdict,
            reason: report.reason,
            stage: VerificationStage::Smtp,
            host: Some(host),
            reply: report.reply,
            transcript: report.transcript,
        }
    }

    /// Binary view: only an explicit acceptance counts.
    pub fn ok(&self) -> bool {
        self.verdict.is_deliverable()
    }
}

/// `{ ok, reason }` pair handed to request-handling collaborators.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverabilityResponse {
    pub ok: bool,
    pub reason: String,
}

impl From<VerificationResult> for DeliverabilityResponse {
    fn from(result: VerificationResult) -> Self {
        Self {
            ok: result.ok(),
            reason: result.reason,
        }
    }
}
