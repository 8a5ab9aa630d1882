//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Server-side failures (`Database`, `Internal`) are logged in full and
//! rendered as a generic error page; their detail never reaches the user.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind, validation::ValidationErrors};
use platform::mail::MailError;
use thiserror::Error;

use crate::presentation::views;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more signup fields failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("An account with this email already exists")]
    EmailTaken,

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account not activated yet
    #[error("Account is not activated")]
    AccountDisabled,

    /// Unknown, expired or already consumed token
    #[error("Invalid verification token: {0}")]
    InvalidVerificationToken(String),

    /// The account was committed but the confirmation mail could not be built
    #[error("The account was created, but the confirmation link could not be sent")]
    ConfirmationMail(#[source] MailError),

    /// Session not found or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Session was evicted by a newer sign-in
    #[error("Session expired because the account signed in elsewhere")]
    SessionExpired,

    #[error("Access denied")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::UnprocessableEntity,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionExpired => ErrorKind::Unauthorized,
            AuthError::AccountDisabled | AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::InvalidVerificationToken(_) => ErrorKind::Gone,
            AuthError::ConfirmationMail(_) => ErrorKind::BadGateway,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError, with a message safe to show to the user
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::new(self.kind(), UNEXPECTED_ERROR_MESSAGE)
                    .with_action("Please try again later")
            }
            AuthError::ConfirmationMail(_) => AppError::new(self.kind(), self.to_string())
                .with_action("Please contact support to receive a new activation link"),
            AuthError::Forbidden => AppError::forbidden("You do not have permission to view this page"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ConfirmationMail(e) => {
                tracing::error!(error = %e, "Confirmation mail could not be sent");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidVerificationToken(token) => {
                tracing::warn!(token = %token, "Invalid verification token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        views::error_response(&self.to_app_error())
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (AuthError::Validation(ValidationErrors::new()), StatusCode::UNPROCESSABLE_ENTITY),
            (AuthError::EmailTaken, StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDisabled, StatusCode::FORBIDDEN),
            (AuthError::InvalidVerificationToken("x".into()), StatusCode::GONE),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let app_error = AuthError::Internal("connection refused on 10.0.0.3".into()).to_app_error();
        assert_eq!(app_error.message(), UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_token_and_mail_errors_are_distinct_kinds() {
        let token = AuthError::InvalidVerificationToken("abc".into());
        let mail = AuthError::ConfirmationMail(MailError::Rejected("smtp down".into()));
        assert_ne!(token.kind(), mail.kind());
        assert_eq!(token.to_string(), "Invalid verification token: abc");
    }
}
