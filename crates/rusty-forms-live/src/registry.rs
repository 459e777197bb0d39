// File: rusty-forms-live/src/registry.rs
// Purpose: Cross-field match rules and debounced remote rules, keyed by field

use crate::debounce::{Debouncer, Settled};
use crate::document::{Field, FieldId, FieldLookup, FormId};
use crate::outcome::ValidationOutcome;
use crate::rules::{MatchRule, RemoteOptions, RemoteRule, ValidationRule};
use crate::transport::{RemoteRequest, RemoteTransport};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Custom rules registered for one field
#[derive(Debug, Clone, Default)]
struct FieldRules {
    /// Form the field belonged to when its first rule was registered
    owner: Option<FormId>,
    matches: Option<MatchRule>,
    remote: Option<RemoteRule>,
}

impl FieldRules {
    fn is_empty(&self) -> bool {
        self.matches.is_none() && self.remote.is_none()
    }
}

/// Holds the rules that are registered imperatively rather than declared
/// on the field: at most one match rule and one remote rule per field.
pub struct RuleRegistry {
    document: Arc<dyn FieldLookup>,
    transport: Arc<dyn RemoteTransport>,
    fallback_message: String,
    rules: RwLock<HashMap<FieldId, FieldRules>>,
    debouncer: Debouncer,
}

impl RuleRegistry {
    pub fn new(
        document: Arc<dyn FieldLookup>,
        transport: Arc<dyn RemoteTransport>,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            document,
            transport,
            fallback_message: fallback_message.into(),
            rules: RwLock::new(HashMap::new()),
            debouncer: Debouncer::new(),
        }
    }

    fn owner_of(&self, field: &FieldId) -> Option<FormId> {
        self.document.field(field).and_then(|f| f.form)
    }

    /// `source` must equal `target`; replaces an earlier match rule on `source`
    pub fn register_match(&self, source: FieldId, target: FieldId, message: impl Into<String>) {
        let owner = self.owner_of(&source);
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let entry = rules.entry(source.clone()).or_default();
        entry.owner = entry.owner.take().or(owner);

        if entry.matches.is_some() {
            tracing::debug!("Replacing match rule on {}", source);
        }
        tracing::debug!("Registered match rule {} == {}", source, target);
        entry.matches = Some(MatchRule {
            target,
            message: message.into(),
        });
    }

    /// Check `field` against `endpoint`; replaces an earlier remote rule
    pub fn register_remote(&self, field: FieldId, endpoint: impl Into<String>, options: RemoteOptions) {
        let owner = self.owner_of(&field);
        let endpoint = endpoint.into();
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let entry = rules.entry(field.clone()).or_default();
        entry.owner = entry.owner.take().or(owner);

        if entry.remote.is_some() {
            tracing::debug!("Replacing remote rule on {}", field);
        }
        tracing::debug!(
            "Registered remote rule on {} -> {} {} ({}ms debounce)",
            field,
            options.method,
            endpoint,
            options.debounce.as_millis()
        );
        entry.remote = Some(RemoteRule { endpoint, options });
    }

    pub fn match_rule(&self, field: &FieldId) -> Option<MatchRule> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.get(field).and_then(|r| r.matches.clone())
    }

    pub fn remote_rule(&self, field: &FieldId) -> Option<RemoteRule> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.get(field).and_then(|r| r.remote.clone())
    }

    /// Full pipeline for `field` in evaluation order
    pub fn rules_for(&self, field: &Field) -> Vec<ValidationRule> {
        let mut pipeline: Vec<ValidationRule> = field
            .constraints
            .iter()
            .cloned()
            .map(ValidationRule::Attribute)
            .collect();

        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(custom) = rules.get(&field.id) {
            if let Some(rule) = &custom.matches {
                pipeline.push(ValidationRule::Match(rule.clone()));
            }
            if let Some(rule) = &custom.remote {
                pipeline.push(ValidationRule::Remote(rule.clone()));
            }
        }

        pipeline
    }

    /// Exact string equality with the target field's current value.
    ///
    /// No rule, or a target that cannot be found, passes.
    pub fn evaluate_match(&self, field: &Field) -> ValidationOutcome {
        match self.match_rule(&field.id) {
            Some(rule) => self.check_match(field, &rule),
            None => ValidationOutcome::valid(),
        }
    }

    /// Check `field` against a specific match rule
    pub fn check_match(&self, field: &Field, rule: &MatchRule) -> ValidationOutcome {
        let Some(target) = self.document.field(&rule.target) else {
            tracing::trace!("Match target {} for {} not found", rule.target, field.id);
            return ValidationOutcome::valid();
        };

        if field.value == target.value {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid(rule.message.clone())
        }
    }

    /// Request body for a remote check
    pub fn request_body(field: &Field, options: &RemoteOptions) -> Value {
        let mut body = Map::new();
        body.insert("fieldId".to_string(), Value::from(field.id.as_str()));
        body.insert(
            "formId".to_string(),
            field.form.as_ref().map_or(Value::Null, |form| Value::from(form.as_str())),
        );
        body.insert("value".to_string(), Value::from(field.value.as_str()));
        for (key, value) in &options.extra_payload {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }

    /// Debounced remote check of `field`'s current value.
    ///
    /// Returns `None` when the field has no remote rule or its pending check
    /// was cancelled. Transport and response failures resolve to an invalid
    /// outcome carrying the fallback message.
    pub async fn evaluate_remote(&self, field: &Field) -> Option<Settled> {
        let rule = self.remote_rule(&field.id)?;
        self.check_remote(field, &rule).await
    }

    /// Debounced check of `field` against a specific remote rule; `None` if
    /// the pending check was cancelled
    pub async fn check_remote(&self, field: &Field, rule: &RemoteRule) -> Option<Settled> {
        let request = RemoteRequest {
            endpoint: rule.endpoint.clone(),
            method: rule.options.method.clone(),
            body: Self::request_body(field, &rule.options),
        };
        let transport = Arc::clone(&self.transport);
        let fallback = self.fallback_message.clone();
        let field_id = field.id.clone();

        let check = async move {
            tracing::debug!(
                "Sending remote check for {} to {} via {}",
                field_id,
                request.endpoint,
                transport.name()
            );

            match transport.send(request).await {
                Ok(response) => response.interpret().unwrap_or_else(|e| {
                    tracing::warn!("Remote check for {} unusable: {}", field_id, e);
                    ValidationOutcome::invalid(fallback)
                }),
                Err(e) => {
                    tracing::warn!("Remote check for {} failed: {}", field_id, e);
                    ValidationOutcome::invalid(fallback)
                }
            }
        };

        self.debouncer.run(&field.id, rule.options.debounce, check).await
    }

    /// Whether `generation` is the newest remote run for `field`
    pub fn is_current(&self, field: &FieldId, generation: u64) -> bool {
        self.debouncer.is_current(field, generation)
    }

    pub fn has_pending(&self, field: &FieldId) -> bool {
        self.debouncer.is_pending(field)
    }

    /// Cancel the field's pending remote check, if any
    pub fn cancel(&self, field: &FieldId) {
        self.debouncer.cancel(field);
    }

    /// Remove every rule owned by `form` or attached to one of `fields`,
    /// cancelling their pending checks. Returns the fields that lost rules.
    pub fn remove_form(&self, form: &FormId, fields: &[FieldId]) -> Vec<FieldId> {
        let removed: Vec<FieldId> = {
            let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
            let doomed: Vec<FieldId> = rules
                .iter()
                .filter(|(id, custom)| custom.owner.as_ref() == Some(form) || fields.contains(*id))
                .map(|(id, _)| id.clone())
                .collect();
            for id in &doomed {
                rules.remove(id);
            }
            doomed
        };

        for id in fields.iter().chain(removed.iter()) {
            self.debouncer.cancel(id);
        }

        removed
    }

    /// Drop every rule and pending check
    pub fn clear(&self) {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.debouncer.cancel_all();
    }

    pub fn len(&self) -> usize {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.values().filter(|custom| !custom.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
