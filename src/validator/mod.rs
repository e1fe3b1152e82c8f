mod domain;
mod local;
mod types;

pub use types::{EmailAddress, SyntaxError, ValidationReport};

use once_cell::sync::Lazy;
use regex::Regex;

use domain::check_domain;
use local::check_local;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+$";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(EMAIL_PATTERN).expect("built-in email pattern failed to compile, this is a bug")
});

/// Returns `true` when `email` matches the accepted address grammar.
///
/// The input is not trimmed and no network access happens.
pub fn is_valid_syntax(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Same verdict as [`is_valid_syntax`], with the reasons spelled out.
pub fn validate_syntax(email: &str) -> ValidationReport {
    let mut reasons = Vec::new();

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        reasons.push("must contain exactly one '@'".to_string());
        return ValidationReport { ok: false, reasons };
    }
    let (local, domain) = (parts[0], parts[1]);

    check_local(local, &mut reasons);
    check_domain(domain, &mut reasons);

    let ok = reasons.is_empty();
    ValidationReport { ok, reasons }
}

impl EmailAddress {
    /// Validates `email` and decomposes it on the last `@`.
    pub fn parse(email: &str) -> Result<Self, SyntaxError> {
        if !is_valid_syntax(email) {
            return Err(SyntaxError {
                reasons: validate_syntax(email).reasons,
            });
        }
        match email.rsplit_once('@') {
            Some((local, domain)) => Ok(Self::from_parts(local, domain)),
            None => Err(SyntaxError {
                reasons: vec!["must contain exactly one '@'".to_string()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_basic() {
        assert!(is_valid_syntax("alice@example.com"));
        assert!(is_valid_syntax("o'brien+tag@mail.example.co.uk"));
        assert!(is_valid_syntax("{weird}|~`@a-b.c"));
    }

    #[test]
    fn rejects_common_mistakes() {
        for input in [
            "",
            "alice",
            "alice@",
            "@example.com",
            "alice@localhost",
            "alice@@example.com",
            "alice@example..com",
            "alice@.example.com",
            "alice smith@example.com",
            " alice@example.com",
            "alice@example.com\n",
            "alice@exa_mple.com",
        ] {
            assert!(!is_valid_syntax(input), "{input:?} should be rejected");
        }
    }

    #[test]
    fn report_lists_reasons() {
        let report = validate_syntax("a b@localhost");
        assert!(!report.ok);
        assert_eq!(report.reasons.len(), 2, "{:?}", report.reasons);

        let report = validate_syntax("a@@b.c");
        assert_eq!(report.reasons, vec!["must contain exactly one '@'"]);
    }

    #[test]
    fn parse_splits_local_and_domain() {
        let address = EmailAddress::parse("first.last@mail.example.org").expect("valid");
        assert_eq!(address.local_part(), "first.last");
        assert_eq!(address.domain(), "mail.example.org");
        assert_eq!(address.to_string(), "first.last@mail.example.org");
    }

    #[test]
    fn parse_rejects_with_reasons() {
        let err = EmailAddress::parse("nobody@nowhere").expect_err("no dot in domain");
        assert!(err.reasons.iter().any(|r| r.contains("at least one dot")));
    }

    proptest! {
        #[test]
        fn report_agrees_with_regex(input in "[a-zA-Z0-9.@_+' é-]{0,24}") {
            prop_assert_eq!(validate_syntax(&input).ok, is_valid_syntax(&input));
        }

        #[test]
        fn strings_without_at_are_rejected(input in "[a-zA-Z0-9._+-]{0,32}") {
            prop_assert!(!is_valid_syntax(&input));
        }

        #[test]
        fn domains_without_dot_are_rejected(
            local in "[a-z0-9._]{1,12}",
            domain in "[a-z0-9-]{1,16}",
        ) {
            let email = format!("{local}@{domain}");
            prop_assert!(!is_valid_syntax(&email));
        }
    }
}
