//! Email Value Object
//!
//! The account's natural key. Trimmed and lower-cased on construction so
//! that uniqueness and equality are case-insensitive. Proof of ownership
//! comes from the verification mail, not from this format check.

use kernel::error::app_error::{AppError, AppResult};
use platform::mail;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Maximum local part length (per RFC 5321)
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// RFC 5322 `atext`: the characters allowed in a dot-atom local part
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> AppResult<Self> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::unprocessable("Email is required"));
        }

        if email.chars().count() > EMAIL_MAX_LENGTH {
            return Err(AppError::unprocessable(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::unprocessable("Invalid email format")
                .with_action("Please enter an address like name@example.com"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.chars().count() > LOCAL_PART_MAX_LENGTH {
            return false;
        }
        if !local.chars().all(|c| c == '.' || is_atext(c)) {
            return false;
        }
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        // Every label: non-empty, alphanumeric or hyphen, no edge hyphens
        let labels_ok = domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

        // The confirmation mail must be able to address it
        labels_ok && mail::is_valid_address(email)
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("jane@example.com").is_ok());
        assert!(Email::new("jane.doe+jar@mail.example.co.uk").is_ok());
        assert!(Email::new("  jane@example.com  ").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("janeexample.com").is_err());
        assert!(Email::new("jane@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("jane@@example.com").is_err());
        assert!(Email::new("jane@example").is_err());
        assert!(Email::new("jane@exa..mple.com").is_err());
        assert!(Email::new("jane doe@example.com").is_err());
        assert!(Email::new("jane@-example.com").is_err());
    }

    #[test]
    fn test_email_rejects_unmailable_local_parts() {
        for address in [
            "a,b@example.com",
            "a<b@example.com",
            "a\"b@example.com",
            "a(b@example.com",
            "a\0b@example.com",
            "a;b@example.com",
        ] {
            assert!(Email::new(address).is_err(), "{address:?} accepted");
        }
    }

    #[test]
    fn test_accepted_emails_are_mailable() {
        for address in ["jane.doe+jar@example.com", "o'brien@example.com", "x_y-z@mail.example.org"] {
            let email = Email::new(address).unwrap();
            assert!(mail::is_valid_address(email.as_str()));
        }
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new(" Jane@Example.COM").unwrap();
        assert_eq!(email.as_str(), "jane@example.com");
        assert_eq!(email, Email::new("jane@example.com").unwrap());
    }

    #[test]
    fn test_email_messages() {
        assert_eq!(
            Email::new("nope").unwrap_err().message(),
            "Invalid email format"
        );
        assert_eq!(Email::new("   ").unwrap_err().message(), "Email is required");
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@{}.com", "a".repeat(60), "b".repeat(200));
        assert!(Email::new(email).is_err());
    }
}
