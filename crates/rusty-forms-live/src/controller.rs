// File: rusty-forms-live/src/controller.rs
// Purpose: Form registration, change/submit signals and the per-field pipeline

use crate::config::ValidatorConfig;
use crate::document::{Constraint, Field, FieldId, FieldLookup, FormId};
use crate::outcome::ValidationOutcome;
use crate::presenter::{DisplaySink, Marker, NullSink, ValidationPresenter};
use crate::registry::RuleRegistry;
use crate::rules::{RemoteOptions, ValidationRule};
use crate::transport::{HttpTransport, RemoteTransport};
use anyhow::{Context, Result};
use futures::future::join_all;
use rusty_forms_validation::{check, RuleViolation};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Callback receiving the full report of a rejected submit
pub type RejectedHook = Arc<dyn Fn(&FormReport) + Send + Sync>;

/// Per-form behavior
#[derive(Clone)]
pub struct FormPolicy {
    /// Validate a field every time its value changes
    pub validate_on_change: bool,
    /// Present every field's outcome when a submit is rejected
    pub show_errors_on_submit: bool,
    pub on_rejected: Option<RejectedHook>,
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            show_errors_on_submit: true,
            on_rejected: None,
        }
    }
}

impl FormPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy taken from the `[forms]` config section
    pub fn from_defaults(config: &ValidatorConfig) -> Self {
        Self {
            validate_on_change: config.forms.validate_on_change,
            show_errors_on_submit: config.forms.show_errors_on_submit,
            on_rejected: None,
        }
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    pub fn show_errors_on_submit(mut self, enabled: bool) -> Self {
        self.show_errors_on_submit = enabled;
        self
    }

    pub fn on_rejected<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FormReport) + Send + Sync + 'static,
    {
        self.on_rejected = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for FormPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPolicy")
            .field("validate_on_change", &self.validate_on_change)
            .field("show_errors_on_submit", &self.show_errors_on_submit)
            .field("on_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

/// Outcome of one field in a form-wide evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub field: FieldId,
    pub outcome: ValidationOutcome,
}

/// Outcomes of every eligible field of a form, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormReport {
    pub form: FormId,
    pub fields: Vec<FieldReport>,
}

impl FormReport {
    /// A form is valid iff every field is
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|report| report.outcome.valid)
    }

    pub fn outcome(&self, field: &FieldId) -> Option<&ValidationOutcome> {
        self.fields
            .iter()
            .find(|report| &report.field == field)
            .map(|report| &report.outcome)
    }

    pub fn invalid_fields(&self) -> Vec<&FieldId> {
        self.fields
            .iter()
            .filter(|report| !report.outcome.valid)
            .map(|report| &report.field)
            .collect()
    }
}

/// What the host should do with an attempted submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDecision {
    Proceed,
    Cancel(FormReport),
}

impl SubmitDecision {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }
}

/// Visible state of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Unvalidated,
    Valid,
    Invalid,
}

/// One field's result plus what is needed to tell whether it is still current
struct Evaluation {
    /// Value the outcome was computed for
    value: String,
    outcome: ValidationOutcome,
    skipped: bool,
    generation: Option<u64>,
}

impl Evaluation {
    fn skipped(field: &Field) -> Self {
        Self {
            value: field.value.clone(),
            outcome: ValidationOutcome::valid(),
            skipped: true,
            generation: None,
        }
    }

    fn local(field: &Field, outcome: ValidationOutcome) -> Self {
        Self {
            value: field.value.clone(),
            outcome,
            skipped: false,
            generation: None,
        }
    }
}

struct Inner {
    config: ValidatorConfig,
    document: Arc<dyn FieldLookup>,
    registry: RuleRegistry,
    presenter: ValidationPresenter,
    forms: RwLock<HashMap<FormId, FormPolicy>>,
    /// Fields whose presentation is being applied right now
    presenting: Mutex<HashSet<FieldId>>,
}

/// Entry point for hosts: registers forms and rules, receives change and
/// submit signals, and drives evaluation and presentation.
///
/// Cloning is cheap and every clone shares the same state. Nothing here
/// returns an error once constructed: unknown fields and forms are no-ops,
/// malformed rules and failed remote checks mark fields invalid.
#[derive(Clone)]
pub struct FormValidator {
    inner: Arc<Inner>,
}

impl FormValidator {
    /// Validator sending remote checks over HTTP, with no display sink
    pub fn new(config: ValidatorConfig, document: Arc<dyn FieldLookup>) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.remote)
            .context("Failed to create HTTP transport for remote checks")?;
        Ok(Self::with_parts(
            config,
            document,
            Arc::new(transport),
            Arc::new(NullSink),
        ))
    }

    pub fn with_parts(
        config: ValidatorConfig,
        document: Arc<dyn FieldLookup>,
        transport: Arc<dyn RemoteTransport>,
        sink: Arc<dyn DisplaySink>,
    ) -> Self {
        let registry = RuleRegistry::new(
            Arc::clone(&document),
            transport,
            config.remote.fallback_message.clone(),
        );
        let presenter = ValidationPresenter::new(config.display.clone(), sink);

        Self {
            inner: Arc::new(Inner {
                config,
                document,
                registry,
                presenter,
                forms: RwLock::new(HashMap::new()),
                presenting: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.inner.registry
    }

    pub fn presenter(&self) -> &ValidationPresenter {
        &self.inner.presenter
    }

    /// Start handling signals for `form`; re-registering replaces the policy
    pub fn register_form(&self, form: impl Into<FormId>, policy: FormPolicy) {
        let form = form.into();
        tracing::debug!("Registered form {} ({:?})", form, policy);
        self.inner
            .forms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(form, policy);
    }

    /// Stop handling `form`, dropping its policy and every custom rule on its
    /// fields and cancelling their pending checks
    pub fn unregister_form(&self, form: &FormId) -> bool {
        let mut forms = self.inner.forms.write().unwrap_or_else(PoisonError::into_inner);
        let existed = forms.remove(form).is_some();

        let fields: Vec<FieldId> = self
            .inner
            .document
            .form_fields(form)
            .into_iter()
            .map(|field| field.id)
            .collect();
        let removed = self.inner.registry.remove_form(form, &fields);
        drop(forms);

        tracing::debug!(
            "Unregistered form {} ({} fields lost custom rules)",
            form,
            removed.len()
        );
        existed
    }

    pub fn is_registered(&self, form: &FormId) -> bool {
        let forms = self.inner.forms.read().unwrap_or_else(PoisonError::into_inner);
        forms.contains_key(form)
    }

    pub fn policy(&self, form: &FormId) -> Option<FormPolicy> {
        let forms = self.inner.forms.read().unwrap_or_else(PoisonError::into_inner);
        forms.get(form).cloned()
    }

    pub fn add_match_validation(
        &self,
        source: impl Into<FieldId>,
        target: impl Into<FieldId>,
        message: impl Into<String>,
    ) {
        self.inner
            .registry
            .register_match(source.into(), target.into(), message);
    }

    pub fn add_server_validation(
        &self,
        field: impl Into<FieldId>,
        endpoint: impl Into<String>,
        options: RemoteOptions,
    ) {
        self.inner
            .registry
            .register_remote(field.into(), endpoint, options);
    }

    /// Remote options seeded from the `[remote]` config section
    pub fn remote_options(&self) -> RemoteOptions {
        let remote = &self.inner.config.remote;
        let options = RemoteOptions::new().debounce(remote.debounce());
        match self.inner.config.remote_method() {
            Ok(method) => options.method(method),
            Err(e) => {
                tracing::warn!("{:#}; using POST", e);
                options
            }
        }
    }

    /// Attribute and match checks only; never suspends or presents
    pub fn check_field(&self, field: &Field) -> ValidationOutcome {
        if field.is_skipped() {
            return ValidationOutcome::valid();
        }

        let local: Vec<ValidationRule> = self
            .inner
            .registry
            .rules_for(field)
            .into_iter()
            .filter(|rule| !rule.is_async())
            .collect();
        self.check_local(field, &local)
    }

    fn check_local(&self, field: &Field, rules: &[ValidationRule]) -> ValidationOutcome {
        for rule in rules {
            let outcome = match rule {
                ValidationRule::Attribute(constraint) => self.check_constraint(field, constraint),
                ValidationRule::Match(rule) => self.inner.registry.check_match(field, rule),
                ValidationRule::Remote(_) => continue,
            };
            if outcome.is_invalid() {
                tracing::trace!("{} failed a {} rule", field.id, rule.kind());
                return outcome;
            }
        }

        ValidationOutcome::valid()
    }

    fn check_constraint(&self, field: &Field, constraint: &Constraint) -> ValidationOutcome {
        match check(&constraint.rule(), &field.value) {
            Ok(()) => ValidationOutcome::valid(),
            Err(RuleViolation::Malformed { rule, reason }) => {
                tracing::warn!("Malformed `{}` rule on {}: {}", rule, field.id, reason);
                ValidationOutcome::invalid(self.inner.config.messages.malformed_rule.clone())
            }
            Err(RuleViolation::Violated { message, .. }) => {
                ValidationOutcome::invalid(field.invalid_message.clone().unwrap_or(message))
            }
        }
    }

    /// Run the full pipeline on the field's current snapshot and present it.
    ///
    /// Unknown fields are valid and nothing is presented.
    pub async fn evaluate_field(&self, id: &FieldId) -> ValidationOutcome {
        match self.inner.document.field(id) {
            Some(field) => self.evaluate(&field).await,
            None => {
                tracing::trace!("Field {} not found; nothing to validate", id);
                ValidationOutcome::valid()
            }
        }
    }

    /// Run the full pipeline on `field` and present the result
    pub async fn evaluate(&self, field: &Field) -> ValidationOutcome {
        self.run(field, true).await.outcome
    }

    /// Evaluate every eligible field of `form` concurrently and present each
    /// outcome as it settles
    pub async fn evaluate_form(&self, form: &FormId) -> FormReport {
        self.collect(form, true).await.0
    }

    /// Change signal from the host.
    ///
    /// Returns `None` when the signal was ignored: unknown field, field
    /// outside any registered form, validation on change turned off, or the
    /// field is in the middle of being presented.
    pub async fn on_field_changed(&self, id: &FieldId) -> Option<ValidationOutcome> {
        if self.is_presenting(id) {
            tracing::trace!("Ignoring change on {} raised while presenting it", id);
            return None;
        }

        let field = self.inner.document.field(id)?;
        let policy = self.policy(field.form.as_ref()?)?;
        if !policy.validate_on_change {
            return None;
        }

        Some(self.evaluate(&field).await)
    }

    /// Submit signal from the host; the host performs or suppresses the
    /// submit based on the decision
    pub async fn on_form_submit_attempted(&self, form: &FormId) -> SubmitDecision {
        let Some(policy) = self.policy(form) else {
            tracing::trace!("Submit on unregistered form {}", form);
            return SubmitDecision::Proceed;
        };

        let (report, evaluations) = self.collect(form, false).await;
        if report.is_valid() {
            tracing::debug!("Submit of {} accepted", form);
            return SubmitDecision::Proceed;
        }

        tracing::debug!(
            "Submit of {} rejected: {} invalid field(s)",
            form,
            report.invalid_fields().len()
        );

        if policy.show_errors_on_submit {
            for (entry, evaluation) in report.fields.iter().zip(&evaluations) {
                self.present_settled(&entry.field, evaluation);
            }
        }

        if let Some(hook) = &policy.on_rejected {
            hook(&report);
        }

        SubmitDecision::Cancel(report)
    }

    pub fn field_state(&self, id: &FieldId) -> FieldState {
        match self.inner.presenter.display(id) {
            None => FieldState::Unvalidated,
            Some(display) if display.marker == Marker::Valid => FieldState::Valid,
            Some(_) => FieldState::Invalid,
        }
    }

    /// Forget every form and rule, cancel pending checks and clear
    /// presentation
    pub fn reset(&self) {
        self.inner
            .forms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.registry.clear();
        self.inner.presenter.clear_all();
        tracing::debug!("Validator reset");
    }

    async fn collect(&self, form: &FormId, present: bool) -> (FormReport, Vec<Evaluation>) {
        let fields: Vec<Field> = self
            .inner
            .document
            .form_fields(form)
            .into_iter()
            .filter(|field| !field.kind.is_submit_control())
            .collect();

        let evaluations = join_all(fields.iter().map(|field| self.run(field, present))).await;

        let report = FormReport {
            form: form.clone(),
            fields: fields
                .into_iter()
                .zip(&evaluations)
                .map(|(field, evaluation)| FieldReport {
                    field: field.id,
                    outcome: evaluation.outcome.clone(),
                })
                .collect(),
        };
        (report, evaluations)
    }

    async fn run(&self, field: &Field, present: bool) -> Evaluation {
        let registry = &self.inner.registry;

        if field.is_skipped() {
            registry.cancel(&field.id);
            return Evaluation::skipped(field);
        }

        let (remote, local): (Vec<ValidationRule>, Vec<ValidationRule>) = registry
            .rules_for(field)
            .into_iter()
            .partition(ValidationRule::is_async);

        let outcome = self.check_local(field, &local);
        let remote = remote.into_iter().find_map(|rule| match rule {
            ValidationRule::Remote(rule) => Some(rule),
            _ => None,
        });

        let Some(remote) = remote.filter(|_| outcome.is_valid()) else {
            // A newer local failure supersedes any remote check still pending
            if registry.remote_rule(&field.id).is_some() {
                registry.cancel(&field.id);
            }
            if present {
                self.present(field, &outcome);
            }
            return Evaluation::local(field, outcome);
        };

        if present {
            self.present(field, &outcome);
        }

        match registry.check_remote(field, &remote).await {
            Some(settled) => {
                if present && registry.is_current(&field.id, settled.generation) {
                    self.present(field, &settled.outcome);
                }
                Evaluation {
                    value: field.value.clone(),
                    outcome: settled.outcome,
                    skipped: false,
                    generation: Some(settled.generation),
                }
            }
            None => {
                tracing::trace!("Remote check for {} was cancelled", field.id);
                Evaluation::local(field, outcome)
            }
        }
    }

    /// Present a form-wide result unless the field has moved on since it was
    /// evaluated: skipped fields, changed values and superseded remote checks
    /// are left alone.
    fn present_settled(&self, id: &FieldId, evaluation: &Evaluation) {
        if evaluation.skipped {
            return;
        }
        let Some(field) = self.inner.document.field(id) else {
            return;
        };
        if field.is_skipped() || field.value != evaluation.value {
            tracing::trace!("Not presenting stale submit result for {}", id);
            return;
        }
        if let Some(generation) = evaluation.generation {
            if !self.inner.registry.is_current(id, generation) {
                tracing::trace!("Not presenting superseded remote result for {}", id);
                return;
            }
        }

        self.present(&field, &evaluation.outcome);
    }

    fn is_presenting(&self, id: &FieldId) -> bool {
        let presenting = self.inner.presenting.lock().unwrap_or_else(PoisonError::into_inner);
        presenting.contains(id)
    }

    fn present(&self, field: &Field, outcome: &ValidationOutcome) {
        {
            let mut presenting = self.inner.presenting.lock().unwrap_or_else(PoisonError::into_inner);
            if !presenting.insert(field.id.clone()) {
                return;
            }
        }

        self.inner.presenter.apply(field, outcome);

        self.inner
            .presenting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&field.id);
    }
}
