//! Helpers shared by the form validators.

/// Length of the trimmed value in Unicode scalar values.
pub fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// Equivalent of an HTML `required` attribute: every value has content.
pub fn all_present(values: &[&str]) -> bool {
    values.iter().all(|v| !v.trim().is_empty())
}

/// Equivalent of `<input type="email">`: a non-empty local part and domain
/// around a single `@`, no whitespace.
pub fn is_email_shaped(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Checks `value` against a mask where `X` stands for an ASCII digit and
/// every other character must match literally.
pub fn matches_mask(value: &str, mask: &str) -> bool {
    value.chars().count() == mask.chars().count()
        && value.chars().zip(mask.chars()).all(|(c, m)| match m {
            'X' => c.is_ascii_digit(),
            _ => c == m,
        })
}
