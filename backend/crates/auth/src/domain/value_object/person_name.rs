//! First and last names on the account.

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;

pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    pub fn first_name(value: &str) -> AppResult<Self> {
        Self::new("Firstname", value)
    }

    pub fn last_name(value: &str) -> AppResult<Self> {
        Self::new("Lastname", value)
    }

    /// `label` names the field in the error message.
    fn new(label: &str, value: &str) -> AppResult<Self> {
        let value = value.trim();
        let len = value.chars().count();

        if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&len) {
            return Err(AppError::unprocessable(format!(
                "{} length should be between {} and {}",
                label, NAME_MIN_LENGTH, NAME_MAX_LENGTH
            )));
        }

        if value.chars().any(char::is_control) {
            return Err(AppError::unprocessable(format!(
                "{} contains invalid characters",
                label
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        assert!(PersonName::first_name("Ann").is_ok());
        assert!(PersonName::first_name(&"a".repeat(100)).is_ok());
        assert!(PersonName::first_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_two_characters_rejected_with_field_message() {
        let err = PersonName::first_name("Jo").unwrap_err();
        assert_eq!(err.message(), "Firstname length should be between 3 and 100");

        let err = PersonName::last_name("Do").unwrap_err();
        assert_eq!(err.message(), "Lastname length should be between 3 and 100");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 3 characters, 9 bytes
        assert!(PersonName::first_name("李小龍").is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(PersonName::last_name("  Doe ").unwrap().as_str(), "Doe");
        assert!(PersonName::last_name("  Do  ").is_err());
    }
}
