//! In-memory repository
//!
//! Same contract as `PgAuthRepository`, including the unique email and the
//! conditional token consumption. Used by tests and local runs without a
//! database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use kernel::id::{AuthSessionId, VerificationTokenId};

use crate::domain::entity::{
    account::{Account, NewAccount},
    auth_session::AuthSession,
    verification_token::VerificationToken,
};
use crate::domain::repository::{
    AccountRepository, AuthSessionRepository, Registration, RegistrationUnitOfWork,
    VerificationTokenRepository,
};
use crate::domain::value_object::{account_id::AccountId, email::Email};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    next_account_id: i32,
    accounts: Vec<Account>,
    tokens: HashMap<VerificationTokenId, VerificationToken>,
    sessions: HashMap<AuthSessionId, AuthSession>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    inner: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.state().accounts.clone()
    }

    pub fn account_count(&self) -> usize {
        self.state().accounts.len()
    }

    pub fn tokens(&self) -> Vec<VerificationToken> {
        self.state().tokens.values().cloned().collect()
    }

    pub fn sessions(&self) -> Vec<AuthSession> {
        self.state().sessions.values().cloned().collect()
    }

    pub fn session(&self, session_id: AuthSessionId) -> Option<AuthSession> {
        self.state().sessions.get(&session_id).cloned()
    }
}

impl AccountRepository for MemoryAuthRepository {
    async fn find_account_by_id(&self, account_id: AccountId) -> AuthResult<Option<Account>> {
        Ok(self
            .state()
            .accounts
            .iter()
            .find(|a| a.account_id == account_id)
            .cloned())
    }

    async fn find_account_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self
            .state()
            .accounts
            .iter()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn account_exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.state().accounts.iter().any(|a| &a.email == email))
    }
}

impl VerificationTokenRepository for MemoryAuthRepository {
    async fn find_token_by_id(
        &self,
        token_id: VerificationTokenId,
    ) -> AuthResult<Option<VerificationToken>> {
        Ok(self.state().tokens.get(&token_id).cloned())
    }
}

impl RegistrationUnitOfWork for MemoryAuthRepository {
    async fn create_registration(
        &self,
        account: &NewAccount,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<Registration> {
        let mut state = self.state();

        if state.accounts.iter().any(|a| a.email == account.email) {
            return Err(AuthError::EmailTaken);
        }

        state.next_account_id += 1;
        let account = account
            .clone()
            .into_account(AccountId::from_db(state.next_account_id), issued_at);
        let token = VerificationToken::issue(account.account_id, issued_at);

        state.accounts.push(account.clone());
        state.tokens.insert(token.token_id, token.clone());

        Ok(Registration { account, token })
    }

    async fn save_verification(
        &self,
        account: &Account,
        token: &VerificationToken,
    ) -> AuthResult<bool> {
        let mut state = self.state();

        match state.tokens.get_mut(&token.token_id) {
            Some(stored) if !stored.is_consumed() => stored.verified_at = token.verified_at,
            _ => return Ok(false),
        }

        if let Some(stored) = state
            .accounts
            .iter_mut()
            .find(|a| a.account_id == account.account_id)
        {
            stored.active = account.active;
            stored.updated_at = account.updated_at;
        }

        Ok(true)
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.state()
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: AuthSessionId) -> AuthResult<Option<AuthSession>> {
        Ok(self.session(session_id))
    }

    async fn find_live_sessions_by_account(
        &self,
        account_id: AccountId,
        now_ms: i64,
    ) -> AuthResult<Vec<AuthSession>> {
        let mut sessions: Vec<AuthSession> = self
            .state()
            .sessions
            .values()
            .filter(|s| s.account_id == account_id && !s.is_evicted() && s.expires_at_ms > now_ms)
            .cloned()
            .collect();

        sessions.sort_by_key(|s| (s.last_activity_at, s.created_at));
        Ok(sessions)
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(stored) = self.state().sessions.get_mut(&session.session_id) {
            stored.expires_at_ms = session.expires_at_ms;
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn evict_sessions(
        &self,
        session_ids: &[AuthSessionId],
        evicted_at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let mut state = self.state();
        let mut evicted = 0;

        for session_id in session_ids {
            if let Some(session) = state.sessions.get_mut(session_id) {
                if !session.is_evicted() {
                    session.evict(evicted_at);
                    evicted += 1;
                }
            }
        }

        Ok(evicted)
    }

    async fn delete_session(&self, session_id: AuthSessionId) -> AuthResult<()> {
        self.state().sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at_ms > now_ms);
        Ok((before - state.sessions.len()) as u64)
    }
}
