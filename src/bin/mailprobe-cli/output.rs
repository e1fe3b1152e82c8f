use std::fmt::Write as _;

use anyhow::{Result, bail};
use mailprobe_lib::verify::REASON_NO_SMTP_HOST;
use mailprobe_lib::{SmtpHost, ValidationReport, Verdict, VerificationResult};

#[cfg(feature = "with-serde")]
pub trait Payload: serde::Serialize {}
#[cfg(feature = "with-serde")]
impl<T: serde::Serialize> Payload for T {}

#[cfg(not(feature = "with-serde"))]
pub trait Payload {}
#[cfg(not(feature = "with-serde"))]
impl<T> Payload for T {}

/// One line of output, whichever command produced it.
pub trait Row: Payload {
    fn human(&self, transcript: bool) -> String;
    /// Counts toward exit code 2.
    fn failed(&self) -> bool;
}

impl Row for VerificationResult {
    fn human(&self, transcript: bool) -> String {
        let tag = match self.verdict {
            Verdict::Deliverable => "[OK]   ",
            Verdict::NotDeliverable => "[FAIL] ",
            Verdict::Undetermined => "[UNSURE]",
        };
        let mut out = format!("{tag} {} :: {}", self.email, self.reason);
        if let Some(host) = &self.host {
            let _ = write!(out, "\n        host: {host}");
        }
        if transcript {
            for event in &self.transcript {
                let _ = write!(out, "\n        {event}");
            }
        }
        out
    }

    fn failed(&self) -> bool {
        !self.ok()
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct ValidateRow {
    pub email: String,
    #[cfg_attr(feature = "with-serde", serde(flatten))]
    pub report: ValidationReport,
}

impl Row for ValidateRow {
    fn human(&self, _transcript: bool) -> String {
        if self.report.ok {
            format!("[OK]    {}", self.email)
        } else {
            format!("[INVALID] {} :: {}", self.email, self.report.reasons.join("; "))
        }
    }

    fn failed(&self) -> bool {
        !self.report.ok
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct HostRow {
    pub domain: String,
    pub candidates: Vec<String>,
    pub host: Option<SmtpHost>,
}

impl Row for HostRow {
    fn human(&self, _transcript: bool) -> String {
        match &self.host {
            Some(host) => {
                let addresses: Vec<String> =
                    host.addresses.iter().map(ToString::to_string).collect();
                format!(
                    "[OK]    {} -> {} ({})",
                    self.domain,
                    host.host,
                    addresses.join(", ")
                )
            }
            None => format!(
                "[NONE]  {} :: {} (tried {})",
                self.domain,
                REASON_NO_SMTP_HOST,
                self.candidates.join(", ")
            ),
        }
    }

    fn failed(&self) -> bool {
        self.host.is_none()
    }
}

pub fn write_reports<T: Row>(rows: &[T], format: &str, transcript: bool) -> Result<()> {
    match format {
        "human" => {
            print!("{}", render_human(rows, transcript));
            Ok(())
        }
        "json" => write_json(rows),
        "ndjson" => write_ndjson(rows),
        other => bail!("unknown --format '{other}', use: human|json|ndjson"),
    }
}

pub fn any_failed<T: Row>(rows: &[T]) -> bool {
    rows.iter().any(Row::failed)
}

pub fn render_human<T: Row>(rows: &[T], transcript: bool) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.human(transcript));
        out.push('\n');
    }
    out
}

#[cfg(feature = "with-serde")]
fn write_json<T: Row>(rows: &[T]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json<T: Row>(_: &[T]) -> Result<()> {
    bail!("format=json requires the 'with-serde' feature")
}

#[cfg(feature = "with-serde")]
fn write_ndjson<T: Row>(rows: &[T]) -> Result<()> {
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson<T: Row>(_: &[T]) -> Result<()> {
    bail!("format=ndjson requires the 'with-serde' feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailprobe_lib::{DialogueStage, SmtpEvent, SmtpReply, VerificationStage, validate_syntax};

    fn rejected() -> VerificationResult {
        VerificationResult {
            email: "ghost@example.com".to_string(),
            verdict: Verdict::NotDeliverable,
            reason: "Server rejected RCPT TO. Code: 550, Message: No such user".to_string(),
            stage: VerificationStage::Smtp,
            host: Some("mail.example.com".to_string()),
            reply: Some(SmtpReply::new(550, "No such user")),
            transcript: vec![
                SmtpEvent::Sent {
                    stage: DialogueStage::RcptTo,
                    command: "RCPT TO:<ghost@example.com>".to_string(),
                },
                SmtpEvent::Received {
                    stage: DialogueStage::RcptTo,
                    reply: SmtpReply::new(550, "No such user"),
                },
            ],
        }
    }

    #[test]
    fn verification_human_output() {
        insta::assert_snapshot!(rejected().human(false), @r"
        [FAIL]  ghost@example.com :: Server rejected RCPT TO. Code: 550, Message: No such user
                host: mail.example.com
        ");
    }

    #[test]
    fn transcript_is_opt_in() {
        insta::assert_snapshot!(rejected().human(true), @r"
        [FAIL]  ghost@example.com :: Server rejected RCPT TO. Code: 550, Message: No such user
                host: mail.example.com
                C: RCPT TO:<ghost@example.com>
                S: 550 No such user
        ");
    }

    #[test]
    fn validate_rows() {
        let rows = [
            ValidateRow {
                email: "user@example.com".to_string(),
                report: validate_syntax("user@example.com"),
            },
            ValidateRow {
                email: "nodot@localhost".to_string(),
                report: validate_syntax("nodot@localhost"),
            },
        ];
        assert!(any_failed(&rows));
        let rendered = render_human(&rows, false);
        assert!(rendered.starts_with("[OK]    user@example.com\n[INVALID] nodot@localhost :: "));
    }

    #[test]
    fn missing_host_row() {
        let row = HostRow {
            domain: "example.invalid".to_string(),
            candidates: mailprobe_lib::candidate_hosts("example.invalid").to_vec(),
            host: None,
        };
        assert!(row.failed());
        insta::assert_snapshot!(row.human(false), @"[NONE]  example.invalid :: Could not find an SMTP server for this domain (tried example.invalid, mail.example.invalid, smtp.example.invalid)");
    }

    #[test]
    fn unknown_format_is_fatal() {
        let err = write_reports(&[rejected()], "csv", false).expect_err("unsupported format");
        assert!(err.to_string().contains("human|json|ndjson"));
    }
}
