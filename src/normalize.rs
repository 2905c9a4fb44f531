//! Canonical form for answer and secret comparison

/// Reduce raw text to its canonical form.
///
/// Trims, lower-cases and collapses every run of whitespace to a single
/// space. All equality checks against accepted answers and gate secrets
/// happen on this form.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
