// File: rusty-forms-live/src/document.rs
// Purpose: Field/form snapshots and the lookup seam onto the host's document

use rusty_forms_validation::AttributeRule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Stable identifier of a form control
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable identifier of a form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FormId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What sort of control a field is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Input,
    Select,
    TextArea,
    /// `submit`, `reset`, `button` and `image` inputs; never validated
    Button,
}

impl FieldKind {
    /// Kind implied by an input's `type` attribute
    pub fn from_input_type(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "submit" | "reset" | "button" | "image" => Self::Button,
            _ => Self::Input,
        }
    }

    pub fn is_submit_control(self) -> bool {
        self == Self::Button
    }
}

/// One declared constraint, e.g. `minlength="8"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(default)]
    pub param: Option<String>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, param: Option<&str>) -> Self {
        Self {
            name: name.into(),
            param: param.map(str::to_string),
        }
    }

    pub fn rule(&self) -> AttributeRule {
        AttributeRule::parse(&self.name, self.param.as_deref())
    }
}

// Attributes that become constraints; the element's own order is kept
const CONSTRAINT_ATTRIBUTES: &[&str] = &[
    "required",
    "minlength",
    "maxlength",
    "pattern",
    "min",
    "max",
    "step",
    "type",
];

/// Snapshot of a form control as the host currently sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub form: Option<FormId>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: String,
    /// Constraints in declared order
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Replaces rule default messages on any attribute failure
    #[serde(default)]
    pub invalid_message: Option<String>,
    /// Shown next to the field when it passes
    #[serde(default)]
    pub valid_message: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<FieldId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            form: None,
            kind: FieldKind::Input,
            value: String::new(),
            constraints: Vec::new(),
            disabled: false,
            read_only: false,
            invalid_message: None,
            valid_message: None,
        }
    }

    /// Build a field from element attributes, keeping their order.
    ///
    /// Boolean attributes (`required`, `disabled`, `readonly`) may carry any
    /// value, including the empty string.
    pub fn from_attributes<'a, I>(id: impl Into<FieldId>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut field = Self::new(id);

        for (name, value) in attrs {
            let name = name.trim().to_ascii_lowercase();
            match name.as_str() {
                "name" => field.name = Some(value.to_string()),
                "form" => field.form = Some(FormId::new(value)),
                "value" => field.value = value.to_string(),
                "disabled" => field.disabled = true,
                "readonly" => field.read_only = true,
                "data-invalid" => field.invalid_message = Some(value.to_string()),
                "data-valid" => field.valid_message = Some(value.to_string()),
                "required" => field.constraints.push(Constraint::new("required", None)),
                "type" => {
                    field.kind = FieldKind::from_input_type(value);
                    field.constraints.push(Constraint::new("type", Some(value)));
                }
                other if CONSTRAINT_ATTRIBUTES.contains(&other) => {
                    field.constraints.push(Constraint::new(other, Some(value)));
                }
                _ => {}
            }
        }

        field
    }

    pub fn in_form(mut self, form: impl Into<FormId>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_constraint(mut self, name: &str, param: Option<&str>) -> Self {
        self.constraints.push(Constraint::new(name, param));
        self
    }

    pub fn with_invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    pub fn with_valid_message(mut self, message: impl Into<String>) -> Self {
        self.valid_message = Some(message.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Disabled and read-only controls are never validated
    pub fn is_skipped(&self) -> bool {
        self.disabled || self.read_only
    }
}

/// Read access to the host's current fields and forms
pub trait FieldLookup: Send + Sync {
    /// Current snapshot of a field, if it exists
    fn field(&self, id: &FieldId) -> Option<Field>;

    /// Fields belonging to `form`, in document order
    fn form_fields(&self, form: &FormId) -> Vec<Field>;
}

#[derive(Default)]
struct DocumentInner {
    fields: HashMap<FieldId, Field>,
    order: Vec<FieldId>,
}

/// In-memory document for hosts without their own field model.
///
/// Cloning shares the same underlying document.
#[derive(Clone, Default)]
pub struct MemoryDocument {
    inner: Arc<RwLock<DocumentInner>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field; a replaced field keeps its position
    pub fn insert(&self, field: Field) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.fields.contains_key(&field.id) {
            inner.order.push(field.id.clone());
        }
        inner.fields.insert(field.id.clone(), field);
    }

    pub fn remove(&self, id: &FieldId) -> Option<Field> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.order.retain(|existing| existing != id);
        inner.fields.remove(id)
    }

    /// Update a field's value; returns false if the field does not exist
    pub fn set_value(&self, id: &FieldId, value: impl Into<String>) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.fields.get_mut(id) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FieldLookup for MemoryDocument {
    fn field(&self, id: &FieldId) -> Option<Field> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.fields.get(id).cloned()
    }

    fn form_fields(&self, form: &FormId) -> Vec<Field> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.fields.get(id))
            .filter(|field| field.form.as_ref() == Some(form))
            .cloned()
            .collect()
    }
}
