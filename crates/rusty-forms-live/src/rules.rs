// File: rusty-forms-live/src/rules.rs
// Purpose: Rules a field can be checked against

use crate::document::{Constraint, FieldId};
use reqwest::Method;
use serde_json::{Map, Value};
use std::time::Duration;

/// One check in a field's pipeline.
///
/// A field runs its `Attribute` rules in declared order, then its `Match`
/// rule, then its `Remote` rule; the first failure wins.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    Attribute(Constraint),
    Match(MatchRule),
    Remote(RemoteRule),
}

impl ValidationRule {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Attribute(_) => "attribute",
            Self::Match(_) => "match",
            Self::Remote(_) => "remote",
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// The field's value must equal another field's value exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub target: FieldId,
    pub message: String,
}

/// Server-side check
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRule {
    pub endpoint: String,
    pub options: RemoteOptions,
}

/// How a remote check is sent
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOptions {
    pub method: Method,
    pub debounce: Duration,
    /// Merged into the request body after the standard keys
    pub extra_payload: Map<String, Value>,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            debounce: Duration::from_millis(300),
            extra_payload: Map::new(),
        }
    }
}

impl RemoteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce_ms(self, millis: u64) -> Self {
        self.debounce(Duration::from_millis(millis))
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_payload.insert(key.into(), value.into());
        self
    }
}
