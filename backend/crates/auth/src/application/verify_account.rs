//! Verify Account Use Case
//!
//! Consumes a verification token and activates its account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::VerificationTokenId;

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Verify account use case
pub struct VerifyAccountUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> VerifyAccountUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Returns the email of the activated account.
    pub async fn execute(&self, token_id: VerificationTokenId) -> AuthResult<Email> {
        self.execute_at(token_id, Utc::now()).await
    }

    /// Unknown, expired and consumed tokens all fail with the same error.
    pub async fn execute_at(
        &self,
        token_id: VerificationTokenId,
        now: DateTime<Utc>,
    ) -> AuthResult<Email> {
        let invalid = || AuthError::InvalidVerificationToken(token_id.to_string());
        let live_time = self.config.token_live_time_chrono()?;

        let mut token = self
            .repo
            .find_token_by_id(token_id)
            .await?
            .filter(|token| !token.is_consumed() && token.is_live_at(now, live_time))
            .ok_or_else(invalid)?;

        let mut account = self
            .repo
            .find_account_by_id(token.account_id)
            .await?
            .ok_or_else(|| {
                AuthError::Internal(format!("Account {} of token {} not found", token.account_id, token_id))
            })?;

        account.activate(now);
        token.consume(now);

        if !self.repo.save_verification(&account, &token).await? {
            return Err(invalid());
        }

        tracing::info!(
            account_id = %account.account_id,
            email = %account.email,
            token_id = %token_id,
            "Account activated"
        );

        Ok(account.email)
    }
}
