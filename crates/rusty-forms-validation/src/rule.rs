//! Attribute rules: a declared constraint name plus its parameter

use crate::format::{is_valid_email, is_valid_tel, is_valid_url};
use crate::numeric::{at_least, at_most, is_number, is_step_aligned, parse_number};
use crate::string::{is_present, matches_pattern, within_max_length, within_min_length};
use std::fmt;

/// Value formats selected by the `type` constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFormat {
    Email,
    Url,
    Number,
    Tel,
    /// Any other type (`text`, `password`, `date`, ...) imposes no format
    Other(String),
}

impl TypeFormat {
    pub fn parse(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "url" => Self::Url,
            "number" => Self::Number,
            "tel" => Self::Tel,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A parsed attribute constraint.
///
/// Parameters that cannot be interpreted (a non-numeric `minlength`, a zero
/// `step`) parse to [`AttributeRule::Malformed`], which always fails.
/// Unrecognized names parse to [`AttributeRule::Unknown`], which always passes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeRule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    Min(f64),
    Max(f64),
    /// `None` is `step="any"`
    Step(Option<f64>),
    Type(TypeFormat),
    Malformed { rule: String, reason: String },
    Unknown(String),
}

impl AttributeRule {
    /// Parse a constraint from its attribute name and parameter
    pub fn parse(name: &str, param: Option<&str>) -> Self {
        let name = name.trim().to_ascii_lowercase();
        let param = param.map(str::trim);

        match name.as_str() {
            "required" => Self::Required,
            "minlength" => parse_length(&name, param).map_or_else(|e| e, Self::MinLength),
            "maxlength" => parse_length(&name, param).map_or_else(|e| e, Self::MaxLength),
            "pattern" => match param {
                Some(pattern) => Self::Pattern(pattern.to_string()),
                None => malformed(&name, "missing pattern"),
            },
            "min" => parse_bound(&name, param).map_or_else(|e| e, Self::Min),
            "max" => parse_bound(&name, param).map_or_else(|e| e, Self::Max),
            "step" => match param {
                Some(step) if step.eq_ignore_ascii_case("any") => Self::Step(None),
                _ => match parse_bound(&name, param) {
                    Ok(step) if step > 0.0 => Self::Step(Some(step)),
                    Ok(step) => malformed(&name, &format!("step must be positive, got {}", step)),
                    Err(e) => e,
                },
            },
            "type" => Self::Type(TypeFormat::parse(param.unwrap_or("text"))),
            _ => Self::Unknown(name),
        }
    }

    /// Attribute name this rule was declared with
    pub fn name(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "minlength",
            Self::MaxLength(_) => "maxlength",
            Self::Pattern(_) => "pattern",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Step(_) => "step",
            Self::Type(_) => "type",
            Self::Malformed { rule, .. } => rule,
            Self::Unknown(name) => name,
        }
    }

    /// Message shown when a field does not configure its own
    pub fn default_message(&self) -> String {
        match self {
            Self::Required => "This field is required".to_string(),
            Self::MinLength(min) => format!("Must be at least {} characters", min),
            Self::MaxLength(max) => format!("Must be at most {} characters", max),
            Self::Pattern(_) => "Please match the requested format".to_string(),
            Self::Min(min) => format!("Must be at least {}", min),
            Self::Max(max) => format!("Must be at most {}", max),
            Self::Step(Some(step)) => format!("Must be a multiple of {}", step),
            Self::Type(TypeFormat::Email) => "Please enter a valid email address".to_string(),
            Self::Type(TypeFormat::Url) => "Please enter a valid URL".to_string(),
            Self::Type(TypeFormat::Number) => "Please enter a number".to_string(),
            Self::Type(TypeFormat::Tel) => "Please enter a valid phone number".to_string(),
            Self::Malformed { .. } => "Invalid validation rule".to_string(),
            Self::Step(None) | Self::Type(TypeFormat::Other(_)) | Self::Unknown(_) => {
                "Invalid value".to_string()
            }
        }
    }
}

impl fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a rule rejected a value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleViolation {
    #[error("{message}")]
    Violated { rule: String, message: String },

    #[error("malformed `{rule}` rule: {reason}")]
    Malformed { rule: String, reason: String },
}

impl RuleViolation {
    pub fn rule(&self) -> &str {
        match self {
            Self::Violated { rule, .. } | Self::Malformed { rule, .. } => rule,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Check `value` against a parsed rule.
///
/// Every rule judges the value as given, so an empty value fails `min`,
/// `minlength`, `type=email` and the like. A value that is not a number is
/// left to `type=number`, `min` and `max`; `step` passes it.
pub fn check(rule: &AttributeRule, value: &str) -> Result<(), RuleViolation> {
    if let AttributeRule::Malformed { rule, reason } = rule {
        return Err(RuleViolation::Malformed {
            rule: rule.clone(),
            reason: reason.clone(),
        });
    }

    let passed = match rule {
        AttributeRule::Required => is_present(value),
        AttributeRule::MinLength(min) => within_min_length(value, *min),
        AttributeRule::MaxLength(max) => within_max_length(value, *max),
        AttributeRule::Pattern(pattern) => {
            matches_pattern(value, pattern).map_err(|e| RuleViolation::Malformed {
                rule: rule.name().to_string(),
                reason: e.to_string(),
            })?
        }
        AttributeRule::Min(min) => at_least(value, *min),
        AttributeRule::Max(max) => at_most(value, *max),
        AttributeRule::Step(None) => true,
        AttributeRule::Step(Some(step)) => {
            parse_number(value).map_or(true, |number| is_step_aligned(number, *step))
        }
        AttributeRule::Type(TypeFormat::Email) => is_valid_email(value),
        AttributeRule::Type(TypeFormat::Url) => is_valid_url(value),
        AttributeRule::Type(TypeFormat::Number) => is_number(value),
        AttributeRule::Type(TypeFormat::Tel) => is_valid_tel(value),
        AttributeRule::Type(TypeFormat::Other(_)) | AttributeRule::Unknown(_) => true,
        AttributeRule::Malformed { .. } => false,
    };

    if passed {
        Ok(())
    } else {
        Err(RuleViolation::Violated {
            rule: rule.name().to_string(),
            message: rule.default_message(),
        })
    }
}

/// Pass/fail for a constraint given by name; malformed rules fail
pub fn evaluate(name: &str, param: Option<&str>, value: &str) -> bool {
    check(&AttributeRule::parse(name, param), value).is_ok()
}

fn malformed(rule: &str, reason: &str) -> AttributeRule {
    AttributeRule::Malformed {
        rule: rule.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_length(rule: &str, param: Option<&str>) -> Result<usize, AttributeRule> {
    let param = param.ok_or_else(|| malformed(rule, "missing length"))?;
    param
        .parse::<usize>()
        .map_err(|_| malformed(rule, &format!("`{}` is not a length", param)))
}

fn parse_bound(rule: &str, param: Option<&str>) -> Result<f64, AttributeRule> {
    let param = param.ok_or_else(|| malformed(rule, "missing number"))?;
    parse_number(param).ok_or_else(|| malformed(rule, &format!("`{}` is not a number", param)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("required", None, "x", true)]
    #[case("required", None, "", false)]
    #[case("required", None, "   ", false)]
    #[case("minlength", Some("3"), "abc", true)]
    #[case("minlength", Some("3"), "ab", false)]
    #[case("maxlength", Some("3"), "abcd", false)]
    #[case("pattern", Some("[0-9]{3}"), "123", true)]
    #[case("pattern", Some("[0-9]{3}"), "1234", false)]
    #[case("min", Some("18"), "18", true)]
    #[case("min", Some("18"), "17", false)]
    #[case("min", Some("18"), "eighteen", false)]
    #[case("max", Some("10"), "10.5", false)]
    #[case("step", Some("0.1"), "0.3", true)]
    #[case("step", Some("0.5"), "0.3", false)]
    #[case("step", Some("any"), "0.333", true)]
    #[case("type", Some("email"), "user@example.com", true)]
    #[case("type", Some("email"), "not-an-email", false)]
    #[case("type", Some("url"), "https://example.com", true)]
    #[case("type", Some("url"), "example.com", false)]
    #[case("type", Some("number"), "3.14", true)]
    #[case("type", Some("number"), "pi", false)]
    #[case("type", Some("tel"), "+1 (555) 010-0000", true)]
    #[case("type", Some("tel"), "call me", false)]
    #[case("type", Some("password"), "anything", true)]
    #[case("data-frobnicate", Some("1"), "anything", true)]
    fn test_evaluate(
        #[case] name: &str,
        #[case] param: Option<&str>,
        #[case] value: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(evaluate(name, param, value), expected);
    }

    #[rstest]
    #[case("required", None, false)]
    #[case("minlength", Some("3"), false)]
    #[case("maxlength", Some("3"), true)]
    #[case("pattern", Some("[a-z]+"), false)]
    #[case("pattern", Some("[a-z]*"), true)]
    #[case("min", Some("1"), false)]
    #[case("max", Some("1"), false)]
    #[case("step", Some("2"), true)]
    #[case("type", Some("email"), false)]
    #[case("type", Some("url"), false)]
    #[case("type", Some("number"), false)]
    #[case("type", Some("tel"), true)]
    #[case("type", Some("text"), true)]
    fn test_empty_value(#[case] name: &str, #[case] param: Option<&str>, #[case] expected: bool) {
        assert_eq!(evaluate(name, param, ""), expected, "{} on an empty value", name);
    }

    #[test]
    fn test_step_ignores_non_numbers() {
        assert!(evaluate("step", Some("0.5"), "abc"));
        assert!(!evaluate("type", Some("number"), "abc"));
    }

    #[test]
    fn test_malformed_rules_fail_closed() {
        assert!(!evaluate("pattern", Some("[unclosed"), "abc"));
        assert!(!evaluate("minlength", Some("three"), "abcdef"));
        assert!(!evaluate("step", Some("0"), "1"));
        assert!(!evaluate("step", Some("-1"), "1"));

        let rule = AttributeRule::parse("pattern", Some("(a"));
        let err = check(&rule, "a").unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.rule(), "pattern");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AttributeRule::parse("MinLength", Some(" 4 ")), AttributeRule::MinLength(4));
        assert_eq!(
            AttributeRule::parse("type", Some("EMAIL")),
            AttributeRule::Type(TypeFormat::Email)
        );
        assert_eq!(AttributeRule::parse("step", Some("ANY")), AttributeRule::Step(None));
    }

    #[test]
    fn test_violation_carries_default_message() {
        let rule = AttributeRule::parse("type", Some("email"));
        let err = check(&rule, "nope").unwrap_err();
        assert_eq!(
            err,
            RuleViolation::Violated {
                rule: "type".to_string(),
                message: "Please enter a valid email address".to_string(),
            }
        );
        assert_eq!(err.to_string(), "Please enter a valid email address");
    }
}
