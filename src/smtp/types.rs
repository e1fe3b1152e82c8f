use std::fmt;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStage {
    Connect,
    Greeting,
    Helo,
    Ehlo,
    StartTls,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for DialogueStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Helo => "HELO",
            Self::Ehlo => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
/// Multi-line replies are joined with `\n`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// EHLO keyword lookup, case-insensitive.
    pub fn has_capability(&self, cap: &str) -> bool {
        self.message.lines().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(cap))
        })
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// A recorded transcript event used for diagnostics.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpEvent {
    Sent {
        stage: DialogueStage,
        command: String,
    },
    Received {
        stage: DialogueStage,
        reply: SmtpReply,
    },
    Error {
        stage: DialogueStage,
        message: String,
    },
}

impl fmt::Display for SmtpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent { command, .. } => write!(f, "C: {command}"),
            Self::Received { reply, .. } => write!(f, "S: {reply}"),
            Self::Error { stage, message } => write!(f, "!  {stage}: {message}"),
        }
    }
}

/// Outcome of a verification.
///
/// `Undetermined` covers the cases where the server could not be asked
/// properly (transport failures, greylisting, `252`). Callers that want a
/// yes/no answer treat it as not deliverable.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Deliverable,
    NotDeliverable,
    Undetermined,
}

impl Verdict {
    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Deliverable)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deliverable => "deliverable",
            Self::NotDeliverable => "not deliverable",
            Self::Undetermined => "undetermined",
        })
    }
}

/// What a single SMTP probe observed.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub verdict: Verdict,
    pub reason: String,
    /// The `RCPT TO` reply, when the dialogue got that far.
    pub reply: Option<SmtpReply>,
    pub transcript: Vec<SmtpEvent>,
}
