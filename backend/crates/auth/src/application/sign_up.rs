//! Sign Up Use Case
//!
//! Registers a pending account, issues its verification token and mails the
//! confirmation link.
//!
//! Every field is validated before anything is written, so a rejected
//! payload leaves no rows behind. The account and token are committed
//! together; the mail is only built afterwards, and a delivery failure never
//! undoes the registration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::validation::ValidationErrors;
use kernel::id::VerificationTokenId;
use platform::mail::MailDispatcher;

use crate::application::config::AuthConfig;
use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    account_id::AccountId,
    email::Email,
    person_name::PersonName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};
use crate::html;

pub const FIELD_FIRST_NAME: &str = "firstname";
pub const FIELD_LAST_NAME: &str = "lastname";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";

/// Sign up input
#[derive(Debug, Clone, Default)]
pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Sign up output
#[derive(Debug, Clone)]
pub struct SignUpOutput {
    pub account_id: AccountId,
    pub email: Email,
    pub token_id: VerificationTokenId,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    mailer: MailDispatcher,
    config: Arc<AuthConfig>,
}

impl<R> SignUpUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, mailer: MailDispatcher, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        input: SignUpInput,
        now: DateTime<Utc>,
    ) -> AuthResult<SignUpOutput> {
        let mut errors = ValidationErrors::new();

        let first_name = errors.check(
            FIELD_FIRST_NAME,
            PersonName::first_name(&input.first_name).map_err(|e| e.message().to_string()),
        );
        let last_name = errors.check(
            FIELD_LAST_NAME,
            PersonName::last_name(&input.last_name).map_err(|e| e.message().to_string()),
        );
        let email = errors.check(
            FIELD_EMAIL,
            Email::new(&input.email).map_err(|e| e.message().to_string()),
        );
        let raw_password = errors.check(
            FIELD_PASSWORD,
            RawPassword::new(input.password).map_err(|e| e.message().to_string()),
        );

        if let Some(email) = &email {
            if self.repo.account_exists_by_email(email).await? {
                errors.push(FIELD_EMAIL, AuthError::EmailTaken.to_string());
            }
        }

        let (Some(first_name), Some(last_name), Some(email), Some(raw_password)) =
            (first_name, last_name, email, raw_password)
        else {
            return Err(AuthError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let new_account = NewAccount::new(first_name, last_name, email, password_hash);

        // The pre-check can race with a concurrent signup; the unique index decides.
        let registration = match self.repo.create_registration(&new_account, now).await {
            Ok(registration) => registration,
            Err(AuthError::EmailTaken) => {
                return Err(AuthError::Validation(ValidationErrors::single(
                    FIELD_EMAIL,
                    AuthError::EmailTaken.to_string(),
                )));
            }
            Err(e) => return Err(e),
        };

        let account = registration.account;
        let token = registration.token;

        tracing::info!(
            account_id = %account.account_id,
            email = %account.email,
            token_id = %token.token_id,
            "Account registered"
        );

        self.send_confirmation(&account, token.token_id)?;

        Ok(SignUpOutput {
            account_id: account.account_id,
            email: account.email,
            token_id: token.token_id,
        })
    }

    fn send_confirmation(&self, account: &Account, token_id: VerificationTokenId) -> AuthResult<()> {
        let mail = &self.config.registration_mail;
        let body = confirmation_body(account, &mail.confirmation_url(token_id));

        self.mailer
            .dispatch(account.email.as_str(), &mail.subject, &mail.sender, &body)
            .map(drop)
            .map_err(AuthError::ConfirmationMail)
    }
}

fn confirmation_body(account: &Account, confirmation_url: &str) -> String {
    let url = html::escape(confirmation_url);
    format!(
        "<p>Hello {name},</p>\
         <p>Thanks for signing up for DropJar. Please confirm your email address \
         to activate your account:</p>\
         <p><a href=\"{url}\">{url}</a></p>\
         <p>If you did not create this account you can ignore this message.</p>",
        name = html::escape(&account.full_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_body_escapes_name() {
        let raw = RawPassword::new("secret123".to_string()).unwrap();
        let account = NewAccount::new(
            PersonName::first_name("<b>Jane</b>").unwrap(),
            PersonName::last_name("Doe").unwrap(),
            Email::new("jane@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
        .into_account(AccountId::from_db(1), Utc::now());

        let body = confirmation_body(&account, "http://localhost/auth/activate?token=abc&x=1");
        assert!(body.contains("Hello &lt;b&gt;Jane&lt;/b&gt; Doe"));
        assert!(body.contains("href=\"http://localhost/auth/activate?token=abc&amp;x=1\""));
    }
}
