/// atext ASCII (RFC 5322) plus '.', sans contrainte de position pour le point.
pub(crate) fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '.'
        )
}

/// Push des raisons invalidantes pour la partie locale dans `reasons`.
pub(crate) fn check_local(local: &str, reasons: &mut Vec<String>) {
    if local.is_empty() {
        reasons.push("local part is empty".to_string());
        return;
    }
    if let Some(bad) = local.chars().find(|c| !is_local_char(*c)) {
        reasons.push(format!("local part has invalid char {bad:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_are_allowed_anywhere() {
        let mut reasons = vec![];
        check_local(".a..b.", &mut reasons);
        assert!(reasons.is_empty(), "{reasons:?}");
    }

    #[test]
    fn rejects_space_and_quotes() {
        let mut reasons = vec![];
        check_local("\"a b\"", &mut reasons);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("invalid char"));
    }

    #[test]
    fn rejects_empty() {
        let mut reasons = vec![];
        check_local("", &mut reasons);
        assert_eq!(reasons, vec!["local part is empty".to_string()]);
    }
}
