//! Normalization of categorical labels
//!
//! Training rows and prediction requests must produce identical labels,
//! otherwise their one-hot columns never line up.

/// Upper-case the first character and lower-case the rest
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn payment_method_label(raw: &str) -> String {
    capitalize(raw.trim())
}

pub fn campaign_label(raw: &str) -> String {
    raw.trim().to_string()
}
