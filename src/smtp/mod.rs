//! Partial SMTP dialogue used to ask a server whether it would take mail for
//! an address, without sending any.

mod error;
mod probe;
mod session;
mod types;

pub use error::ProbeError;
pub use probe::probe;
pub use types::{DialogueStage, ProbeReport, SmtpEvent, SmtpReply, Verdict};
