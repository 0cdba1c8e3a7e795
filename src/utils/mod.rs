//! Utility functions and helpers.

/// Placeholder used when no source supplies a schedule value.
pub const PLACEHOLDER: &str = "-";

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A value that carries no information: blank or the placeholder itself.
pub fn is_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

/// First candidate that is not blank, trimmed.
pub fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !is_blank(value))
}
