//! Sign In Use Case
//!
//! Authenticates an account and creates a session.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use kernel::id::AuthSessionId;

use crate::application::{config::AuthConfig, session_token};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    account_id::AccountId,
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Verified against when the email is unknown, so that path costs one
/// Argon2 run like a wrong password does.
static DUMMY_PASSWORD_HASH: LazyLock<Option<UserPassword>> = LazyLock::new(|| {
    RawPassword::new("dropjar-unknown-account".to_string())
        .and_then(|raw| UserPassword::from_raw(&raw, None))
        .ok()
});

/// Sign in input
#[derive(Debug, Clone, Default)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug, Clone)]
pub struct SignInOutput {
    /// Session token for cookie
    pub session_token: String,
    pub account_id: AccountId,
    pub email: Email,
    pub role: UserRole,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> SignInUseCase<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        input: SignInInput,
        now: DateTime<Utc>,
    ) -> AuthResult<SignInOutput> {
        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let account = match Email::new(&input.email) {
            Ok(email) => self.repo.find_account_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(account) = account else {
            if let Some(dummy) = DUMMY_PASSWORD_HASH.as_ref() {
                let _ = dummy.verify(&raw_password, self.config.pepper());
            }
            return Err(AuthError::InvalidCredentials);
        };

        // Password first, so an inactive account does not reveal itself to a guess
        if !account.password_hash.verify(&raw_password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        if !account.active {
            return Err(AuthError::AccountDisabled);
        }

        let session = AuthSession::new(&account, self.config.idle_ttl_chrono()?, now);
        self.repo.create_session(&session).await?;

        let evicted = self.enforce_session_limit(&session, now).await?;

        let session_token = session_token::sign(&self.config.session_secret, session.session_id)?;

        tracing::info!(
            account_id = %account.account_id,
            session_id = %session.session_id,
            evicted_sessions = evicted,
            "User signed in"
        );

        Ok(SignInOutput {
            session_token,
            account_id: account.account_id,
            email: account.email,
            role: account.role,
        })
    }

    /// Mark the least recently active sessions evicted so that at most
    /// `maximum_sessions` remain, the new one included.
    async fn enforce_session_limit(
        &self,
        current: &AuthSession,
        now: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let Some(maximum) = self.config.maximum_sessions else {
            return Ok(0);
        };

        let others: Vec<AuthSessionId> = self
            .repo
            .find_live_sessions_by_account(current.account_id, now.timestamp_millis())
            .await?
            .into_iter()
            .map(|s| s.session_id)
            .filter(|id| *id != current.session_id)
            .collect();

        let keep = maximum.saturating_sub(1);
        if others.len() <= keep {
            return Ok(0);
        }

        // Ordered least recently active first
        let excess = others.len() - keep;
        self.repo.evict_sessions(&others[..excess], now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        let dummy = DUMMY_PASSWORD_HASH.as_ref().unwrap();
        assert!(dummy.as_phc_string().starts_with("$argon2id$"));

        let guess = RawPassword::new("secret123".to_string()).unwrap();
        assert!(!dummy.verify(&guess, None));
    }
}
