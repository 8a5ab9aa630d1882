//! Field-level validation errors
//!
//! Form validation collects every failing field before giving up, so the
//! form can be re-rendered with all messages at once.

use std::fmt;

use serde::Serialize;

/// A single failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of [`FieldError`]s.
///
/// ```rust
/// use kernel::error::validation::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.push("firstname", "Firstname length should be between 3 and 100");
/// assert_eq!(
///     errors.message_for("firstname"),
///     Some("Firstname length should be between 3 and 100")
/// );
/// assert!(!errors.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection holding one error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record the error of a fallible field conversion, returning the value
    /// on success.
    pub fn check<T, E: fmt::Display>(
        &mut self,
        field: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut errors = ValidationErrors::new();
        errors.push("firstname", "too short");
        errors.push("email", "Invalid email format");
        errors.push("firstname", "second message");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.message_for("firstname"), Some("too short"));
        assert_eq!(errors.message_for("password"), None);
        assert_eq!(
            errors.to_string(),
            "firstname: too short; email: Invalid email format; firstname: second message"
        );
    }

    #[test]
    fn test_check_records_failures_only() {
        let mut errors = ValidationErrors::new();
        let ok: Option<u8> = errors.check("age", "42".parse::<u8>());
        let bad: Option<u8> = errors.check("size", "x".parse::<u8>());

        assert_eq!(ok, Some(42));
        assert_eq!(bad, None);
        assert_eq!(errors.len(), 1);
        assert!(errors.message_for("size").is_some());
    }
}
