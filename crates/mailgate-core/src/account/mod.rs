//! Account configuration.
//!
//! Provides the serializable account record and its validation.

mod model;
mod validation;

pub use model::ImapAccount;
pub use validation::{ValidationError, ValidationResult, validate_account};
