//! Form and query DTOs (Data Transfer Objects)

use serde::Deserialize;

use crate::application::{SignInInput, SignUpInput};

// ============================================================================
// Sign Up
// ============================================================================

/// Registration form, `application/x-www-form-urlencoded`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

impl From<SignUpForm> for SignUpInput {
    fn from(form: SignUpForm) -> Self {
        Self {
            first_name: form.firstname,
            last_name: form.lastname,
            email: form.email,
            password: form.password,
        }
    }
}

// ============================================================================
// Sign In
// ============================================================================

/// Credential form posted to the login processing URL
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl From<SignInForm> for SignInInput {
    fn from(form: SignInForm) -> Self {
        Self {
            email: form.email,
            password: form.password,
        }
    }
}

/// Markers on the sign-in page URL (`?error`, `?logout`, `?expired`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInQuery {
    pub error: Option<String>,
    pub logout: Option<String>,
    pub expired: Option<String>,
}

// ============================================================================
// Activation
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivateQuery {
    pub token: Option<String>,
}
