// File: rusty-forms-live/src/outcome.rs
// Purpose: Result of evaluating one field

use serde::{Deserialize, Serialize};

/// Pass/fail plus the message to show for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    /// Failure without a message of its own
    pub fn invalid_silent() -> Self {
        Self {
            valid: false,
            message: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_invalid(&self) -> bool {
        !self.valid
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&ValidationOutcome::invalid("Taken")).unwrap();
        assert_eq!(json, r#"{"valid":false,"message":"Taken"}"#);

        let json = serde_json::to_string(&ValidationOutcome::valid()).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
    }
}
