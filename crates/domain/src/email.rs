//! Minimal e-mail address check.

/// Returns true if `input` looks like a deliverable address.
///
/// Accepts `local@domain.tld` and the display form `Name <local@domain.tld>`.
/// The domain needs at least two labels made of letters, digits and inner
/// hyphens.
pub fn is_valid_email(input: &str) -> bool {
    let input = input.trim();
    let address = match input.rfind('<') {
        Some(start) => match input[start + 1..].strip_suffix('>') {
            Some(inner) => inner,
            None => return false,
        },
        None => input,
    };

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty()
        || domain.contains('@')
        || local
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ',' | ';'))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| is_domain_label(label))
}

fn is_domain_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_alphanumeric() || c == '-')
}
