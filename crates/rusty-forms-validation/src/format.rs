//! Typed format checks (`type=email`, `type=url`, `type=tel`)

use once_cell::sync::Lazy;
use regex::Regex;

// Conservative shape: local@domain.tld with no whitespace and a single '@'
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

static TEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\s()\-]*$").expect("tel regex is valid"));

/// Validate email shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Validate an absolute URL (scheme required)
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// Digits, spaces, `+`, `-` and parentheses only
pub fn is_valid_tel(value: &str) -> bool {
    TEL_REGEX.is_match(value)
}
