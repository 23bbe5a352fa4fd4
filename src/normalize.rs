//! Complaint text cleanup applied before encoding.
//!
//! The patterns here are the ones the classifiers were trained with. Changing
//! any of them shifts the input distribution the classifiers see, so treat this
//! module as part of the model artifacts.

use regex::Regex;
use std::sync::LazyLock;

// Whitespace here also covers the U+001C..U+001F information separators, which
// the training-time cleaning treated as whitespace.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http[^\s\x1C-\x1F]+|www[^\s\x1C-\x1F]+").expect("static URL pattern is valid")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\s\x1C-\x1F]+@[^\s\x1C-\x1F]+").expect("static email pattern is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\x1C-\x1F]+").expect("static whitespace pattern is valid")
});

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Lower-cases `text`, strips URLs and email addresses, and collapses whitespace.
///
/// Pure and deterministic; never fails. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_urls = URL_PATTERN.replace_all(&lowered, "");
    let without_emails = EMAIL_PATTERN.replace_all(&without_urls, "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_emails, " ");
    collapsed.trim_matches(is_separator).to_string()
}
