// File: rusty-forms-live/src/presenter.rs
// Purpose: Turn outcomes into marker/annotation changes on a field

use crate::config::DisplayConfig;
use crate::document::{Field, FieldId};
use crate::outcome::ValidationOutcome;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Which of the two mutually exclusive markers a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Valid,
    Invalid,
}

/// Message element placed next to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub marker: Marker,
    pub text: String,
}

impl Annotation {
    /// Attribute identifying the element to host styling
    pub fn attribute(&self) -> &'static str {
        match self.marker {
            Marker::Valid => "data-valid",
            Marker::Invalid => "data-invalid",
        }
    }
}

/// Visible validation state of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDisplay {
    pub marker: Marker,
    pub annotation: Option<Annotation>,
}

/// Receives presentation changes; implemented by the host UI
pub trait DisplaySink: Send + Sync {
    /// Add marker `add` to the field and remove marker `remove`
    fn set_marker(&self, field: &FieldId, add: &str, remove: &str);

    /// Remove the annotation previously attached to the field
    fn remove_annotation(&self, field: &FieldId);

    /// Attach an annotation adjacent to the field
    fn attach_annotation(&self, field: &FieldId, annotation: &Annotation);

    /// Remove both markers (field back to unvalidated)
    fn clear_markers(&self, field: &FieldId, markers: [&str; 2]) {
        let _ = (field, markers);
    }
}

/// Sink that drops every change; presentation state is still tracked
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn set_marker(&self, _field: &FieldId, _add: &str, _remove: &str) {}
    fn remove_annotation(&self, _field: &FieldId) {}
    fn attach_annotation(&self, _field: &FieldId, _annotation: &Annotation) {}
}

/// Tracks what each field currently shows and forwards changes to a sink.
///
/// `apply` is idempotent: re-applying the state a field already shows emits
/// nothing. Changes to one field never touch another field's state.
pub struct ValidationPresenter {
    config: DisplayConfig,
    sink: Arc<dyn DisplaySink>,
    state: Mutex<HashMap<FieldId, FieldDisplay>>,
}

impl ValidationPresenter {
    pub fn new(config: DisplayConfig, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            config,
            sink,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// What `outcome` should look like on `field`
    pub fn target(field: &Field, outcome: &ValidationOutcome) -> FieldDisplay {
        if outcome.valid {
            FieldDisplay {
                marker: Marker::Valid,
                annotation: field.valid_message.as_ref().map(|text| Annotation {
                    marker: Marker::Valid,
                    text: text.clone(),
                }),
            }
        } else {
            FieldDisplay {
                marker: Marker::Invalid,
                annotation: outcome.message.as_ref().map(|text| Annotation {
                    marker: Marker::Invalid,
                    text: text.clone(),
                }),
            }
        }
    }

    /// Show `outcome` on `field`; returns whether anything changed
    pub fn apply(&self, field: &Field, outcome: &ValidationOutcome) -> bool {
        let target = Self::target(field, outcome);

        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.get(&field.id) == Some(&target) {
                return false;
            }
            state.insert(field.id.clone(), target.clone())
        };

        if previous.as_ref().map_or(false, |p| p.annotation.is_some()) {
            self.sink.remove_annotation(&field.id);
        }

        let (add, remove) = match target.marker {
            Marker::Valid => (&self.config.valid_marker, &self.config.invalid_marker),
            Marker::Invalid => (&self.config.invalid_marker, &self.config.valid_marker),
        };
        self.sink.set_marker(&field.id, add, remove);

        if let Some(annotation) = &target.annotation {
            self.sink.attach_annotation(&field.id, annotation);
        }

        tracing::trace!("Presented {:?} on {}", target.marker, field.id);
        true
    }

    /// Revert a field to unvalidated
    pub fn clear(&self, field: &FieldId) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.remove(field)
        };

        if let Some(previous) = previous {
            if previous.annotation.is_some() {
                self.sink.remove_annotation(field);
            }
            self.sink.clear_markers(
                field,
                [self.config.valid_marker.as_str(), self.config.invalid_marker.as_str()],
            );
        }
    }

    /// Revert every field to unvalidated
    pub fn clear_all(&self) {
        let fields: Vec<FieldId> = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.keys().cloned().collect()
        };
        for field in fields {
            self.clear(&field);
        }
    }

    pub fn display(&self, field: &FieldId) -> Option<FieldDisplay> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.get(field).cloned()
    }
}
