//! String validation functions

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// `required`: the value, trimmed, is non-empty
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Length in Unicode scalar values
pub fn char_length(value: &str) -> usize {
    value.chars().count()
}

pub fn within_min_length(value: &str, min: usize) -> bool {
    char_length(value) >= min
}

pub fn within_max_length(value: &str, max: usize) -> bool {
    char_length(value) <= max
}

/// Full-string match against `pattern`.
///
/// The pattern is anchored on both ends the way the HTML `pattern` attribute
/// is, so `[a-z]+` rejects `abc1`. Compiled patterns are cached by source text.
pub fn matches_pattern(value: &str, pattern: &str) -> Result<bool, regex::Error> {
    let mut cache = PATTERN_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let regex = match cache.get(pattern) {
        Some(regex) => regex.clone(),
        None => {
            let regex = Regex::new(&format!("^(?:{})$", pattern))?;
            cache.insert(pattern.to_string(), regex.clone());
            regex
        }
    };

    Ok(regex.is_match(value))
}
