//! Sample Validation
//!
//! Range and consistency checks applied to every incoming sample before it
//! reaches the alert pipeline. A failed check means the sample is dropped.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, Validator};
