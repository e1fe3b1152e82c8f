/// Valide le domaine: au moins deux labels `[A-Za-z0-9-]+` séparés par des points.
/// Push des raisons invalidantes dans `reasons`.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    if domain.is_empty() {
        reasons.push("domain is empty".to_string());
        return;
    }

    // au moins un point
    if !domain.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }

    for label in domain.split('.') {
        if label.is_empty() {
            reasons.push("empty domain label".to_string());
            continue;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            reasons.push(format!("domain label '{label}' has invalid chars"));
        }
    }
}
