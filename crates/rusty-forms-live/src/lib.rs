//! Rusty-Forms-Live
//!
//! Live validation for form controls. A [`FormValidator`] receives change and
//! submit signals from the host, runs each field's pipeline (declared
//! attribute constraints, then an optional cross-field match, then an
//! optional debounced server check) and hands the outcome to a
//! [`DisplaySink`] through the [`ValidationPresenter`].
//!
//! ```no_run
//! use rusty_forms_live::{Field, FormPolicy, FormValidator, MemoryDocument, ValidatorConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let doc = MemoryDocument::new();
//! doc.insert(Field::from_attributes("email", [("form", "signup"), ("type", "email"), ("required", "")]));
//!
//! let validator = FormValidator::new(ValidatorConfig::load_default()?, Arc::new(doc.clone()))?;
//! validator.register_form("signup", FormPolicy::new());
//!
//! let decision = validator.on_form_submit_attempted(&"signup".into()).await;
//! assert!(decision.is_cancelled());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod debounce;
pub mod document;
pub mod error;
pub mod outcome;
pub mod presenter;
pub mod registry;
pub mod rules;
pub mod transport;

pub use config::{DisplayConfig, FormDefaults, MessageConfig, RemoteConfig, ValidatorConfig};
pub use controller::{
    FieldReport, FieldState, FormPolicy, FormReport, FormValidator, RejectedHook, SubmitDecision,
};
pub use debounce::{Debouncer, Settled};
pub use document::{Constraint, Field, FieldId, FieldKind, FieldLookup, FormId, MemoryDocument};
pub use error::{ResponseError, TransportError};
pub use outcome::ValidationOutcome;
pub use presenter::{Annotation, DisplaySink, FieldDisplay, Marker, NullSink, ValidationPresenter};
pub use registry::RuleRegistry;
pub use rules::{MatchRule, RemoteOptions, RemoteRule, ValidationRule};
pub use transport::{HttpTransport, RemoteRequest, RemoteResponse, RemoteTransport};

pub use rusty_forms_validation::{AttributeRule, RuleViolation, TypeFormat};
