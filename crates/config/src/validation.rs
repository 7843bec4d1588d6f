//! Common validators for settings values

pub use crate::error::ValidationError;

/// Common validators for settings values
pub struct Validator;

impl Validator {
    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that `value` does not appear earlier in `seen`
    pub fn unique<'a>(
        value: &'a str,
        seen: &mut Vec<&'a str>,
        field: &str,
    ) -> Result<(), ValidationError> {
        if seen.contains(&value) {
            return Err(ValidationError::with_value(field, "must be unique", value));
        }
        seen.push(value);
        Ok(())
    }
}
