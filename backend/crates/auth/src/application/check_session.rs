//! Check Session Use Case
//!
//! Verifies and retrieves session information.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::{config::AuthConfig, session_token};
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthSessionRepository;
use crate::error::{AuthError, AuthResult};

/// Check session use case
pub struct CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    pub async fn execute(&self, session_token: &str) -> AuthResult<AuthSession> {
        self.execute_at(session_token, Utc::now()).await
    }

    /// Get session and update last activity
    ///
    /// An evicted session fails once with `SessionExpired`; its row is
    /// removed, so later requests with the same cookie see `SessionInvalid`.
    pub async fn execute_at(
        &self,
        session_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthSession> {
        let session_id = session_token::verify(&self.config.session_secret, session_token)
            .ok_or(AuthError::SessionInvalid)?;

        let mut session = self
            .session_repo
            .find_session(session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_evicted() {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionExpired);
        }

        if session.is_expired_at(now) {
            self.session_repo.delete_session(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        session.touch(now, self.config.idle_ttl_chrono()?);

        // Update in background
        let session_clone = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update_session(&session_clone).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
