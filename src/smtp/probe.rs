#[cfg(feature = "with-starttls")]
use native_tls::TlsConnector;
use tracing::warn;

use super::error::ProbeError;
use super::session::SmtpSession;
use super::types::{DialogueStage, ProbeReport, SmtpEvent, SmtpReply, Verdict};
use crate::config::ProbeOptions;
use crate::resolver::SmtpHost;
use crate::validator::EmailAddress;

/// Runs greeting, `HELO`, `MAIL FROM` and `RCPT TO` against `host` and judges
/// the `RCPT TO` reply. No message body is ever sent.
///
/// Transport failures do not escape: they come back as an `Undetermined`
/// report whose reason starts with `SMTP error:`.
pub fn probe(host: &SmtpHost, address: &EmailAddress, options: &ProbeOptions) -> ProbeReport {
    let mut session = match SmtpSession::connect(host, options.timeout) {
        Ok(session) => session,
        Err(err) => {
            warn!(host = %host.host, error = %err, "SMTP connection failed");
            let transcript = vec![SmtpEvent::Error {
                stage: DialogueStage::Connect,
                message: err.to_string(),
            }];
            return transport_failure(&err, transcript);
        }
    };

    let outcome = run_dialogue(&mut session, address, options);
    if outcome.is_ok() {
        session.quit();
    }
    let transcript = session.take_transcript();
    drop(session);

    match outcome {
        Ok(reply) => classify_rcpt(reply, transcript),
        Err(err) => {
            warn!(host = %host.host, error = %err, "SMTP dialogue failed");
            transport_failure(&err, transcript)
        }
    }
}

fn run_dialogue(
    session: &mut SmtpSession,
    address: &EmailAddress,
    options: &ProbeOptions,
) -> Result<SmtpReply, ProbeError> {
    let greeting = session.read_reply(DialogueStage::Greeting)?;
    if greeting.code != 220 {
        return Err(ProbeError::Greeting {
            code: greeting.code,
            message: greeting.message,
        });
    }

    identify(session, options)?;

    // replies to HELO and MAIL FROM are recorded, never judged
    session.command(
        DialogueStage::MailFrom,
        &format!("MAIL FROM:<{}>", options.mail_from),
    )?;
    session.command(DialogueStage::RcptTo, &format!("RCPT TO:<{address}>"))
}

#[cfg(not(feature = "with-starttls"))]
fn identify(session: &mut SmtpSession, options: &ProbeOptions) -> Result<(), ProbeError> {
    session.command(
        DialogueStage::Helo,
        &format!("HELO {}", options.helo_domain),
    )?;
    Ok(())
}

#[cfg(feature = "with-starttls")]
fn identify(session: &mut SmtpSession, options: &ProbeOptions) -> Result<(), ProbeError> {
    let helo = format!("HELO {}", options.helo_domain);
    if !options.starttls {
        session.command(DialogueStage::Helo, &helo)?;
        return Ok(());
    }

    let ehlo = format!("EHLO {}", options.helo_domain);
    let reply = session.command(DialogueStage::Ehlo, &ehlo)?;
    if !reply.is_positive_completion() {
        // EHLO inconnu: on retombe sur HELO, sans TLS
        session.command(DialogueStage::Helo, &helo)?;
        return Ok(());
    }
    if reply.has_capability("STARTTLS") {
        let connector = TlsConnector::new().map_err(|source| ProbeError::Tls { source })?;
        session.starttls(&connector)?;
        session.command(DialogueStage::Ehlo, &ehlo)?;
    }
    Ok(())
}

/// `250`/`251` accept. Other 2xx (`252` and friends) and 4xx leave the
/// question open; the rest rejects.
pub(crate) fn classify_rcpt(reply: SmtpReply, transcript: Vec<SmtpEvent>) -> ProbeReport {
    let (verdict, summary) = match reply.code {
        250 | 251 => (Verdict::Deliverable, "Server accepted RCPT TO"),
        200..=299 => (Verdict::Undetermined, "Server did not confirm RCPT TO"),
        400..=499 => (Verdict::Undetermined, "Server rejected RCPT TO"),
        _ => (Verdict::NotDeliverable, "Server rejected RCPT TO"),
    };
    let reason = format!(
        "{summary}. Code: {}, Message: {}",
        reply.code, reply.message
    );
    ProbeReport {
        verdict,
        reason,
        reply: Some(reply),
        transcript,
    }
}

fn transport_failure(err: &ProbeError, transcript: Vec<SmtpEvent>) -> ProbeReport {
    ProbeReport {
        verdict: Verdict::Undetermined,
        reason: format!("SMTP error: {err}"),
        reply: None,
        transcript,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        let verdict = |code| classify_rcpt(SmtpReply::new(code, "x"), Vec::new()).verdict;
        assert_eq!(verdict(250), Verdict::Deliverable);
        assert_eq!(verdict(251), Verdict::Deliverable);
        assert_eq!(verdict(252), Verdict::Undetermined);
        assert_eq!(verdict(451), Verdict::Undetermined);
        assert_eq!(verdict(550), Verdict::NotDeliverable);
        assert_eq!(verdict(553), Verdict::NotDeliverable);
        assert_eq!(verdict(354), Verdict::NotDeliverable);
    }

    #[test]
    fn reason_keeps_code_and_message() {
        let report = classify_rcpt(SmtpReply::new(550, "5.1.1 No such user"), Vec::new());
        insta::assert_snapshot!(
            report.reason,
            @"Server rejected RCPT TO. Code: 550, Message: 5.1.1 No such user"
        );
        let report = classify_rcpt(SmtpReply::new(250, "2.1.5 Ok"), Vec::new());
        insta::assert_snapshot!(
            report.reason,
            @"Server accepted RCPT TO. Code: 250, Message: 2.1.5 Ok"
        );
        let report = classify_rcpt(
            SmtpReply::new(252, "2.5.0 Cannot verify user, will attempt delivery"),
            Vec::new(),
        );
        insta::assert_snapshot!(
            report.reason,
            @"Server did not confirm RCPT TO. Code: 252, Message: 2.5.0 Cannot verify user, will attempt delivery"
        );
    }
}
