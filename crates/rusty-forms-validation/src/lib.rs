//! Rusty-Forms-Validation Core
//!
//! Pure predicates for the declarative constraints a form control can carry
//! (`required`, `minlength`, `pattern`, `type=email`, ...). Every check is
//! synchronous and side-effect free, so the same rules can back live
//! client-side validation and server-side re-checks.
//!
//! ```
//! use rusty_forms_validation::{check, evaluate, AttributeRule};
//!
//! assert!(evaluate("minlength", Some("3"), "abcd"));
//! assert!(!evaluate("type", Some("email"), "not-an-email"));
//! assert!(evaluate("x-unknown", None, "anything"));
//!
//! let rule = AttributeRule::parse("pattern", Some("[a-z]+"));
//! assert!(check(&rule, "abc").is_ok());
//! ```

pub mod format;
pub mod numeric;
pub mod rule;
pub mod string;

pub use format::*;
pub use numeric::*;
pub use rule::{check, evaluate, AttributeRule, RuleViolation, TypeFormat};
pub use string::*;
