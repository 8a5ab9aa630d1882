//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (`PgAuthRepository`, `MemoryAuthRepository`).
//!
//! Method names are unique across traits so a single store type can
//! implement all of them without call-site ambiguity.

use chrono::{DateTime, Utc};
use kernel::id::{AuthSessionId, VerificationTokenId};

use crate::domain::entity::{
    account::{Account, NewAccount},
    auth_session::AuthSession,
    verification_token::VerificationToken,
};
use crate::domain::value_object::{account_id::AccountId, email::Email};
use crate::error::AuthResult;

/// Account and token created together at signup
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub token: VerificationToken,
}

/// Account lookups
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn find_account_by_id(&self, account_id: AccountId) -> AuthResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    async fn account_exists_by_email(&self, email: &Email) -> AuthResult<bool>;
}

/// Verification token lookups
#[trait_variant::make(VerificationTokenRepository: Send)]
pub trait LocalVerificationTokenRepository {
    async fn find_token_by_id(
        &self,
        token_id: VerificationTokenId,
    ) -> AuthResult<Option<VerificationToken>>;
}

/// Multi-row writes that must be atomic
#[trait_variant::make(RegistrationUnitOfWork: Send)]
pub trait LocalRegistrationUnitOfWork {
    /// Insert the account and its first verification token in one
    /// transaction. A duplicate email yields `AuthError::EmailTaken`.
    async fn create_registration(
        &self,
        account: &NewAccount,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<Registration>;

    /// Persist an activation: the account's active flag and the token's
    /// `verified_at`, in one transaction. Returns `false` when the token was
    /// consumed concurrently, in which case nothing is written.
    async fn save_verification(
        &self,
        account: &Account,
        token: &VerificationToken,
    ) -> AuthResult<bool>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()>;

    /// Includes evicted and expired sessions; the caller decides.
    async fn find_session(&self, session_id: AuthSessionId) -> AuthResult<Option<AuthSession>>;

    /// Sessions of an account that are neither evicted nor expired at
    /// `now_ms`, least recently active first.
    async fn find_live_sessions_by_account(
        &self,
        account_id: AccountId,
        now_ms: i64,
    ) -> AuthResult<Vec<AuthSession>>;

    /// Persist activity (`last_activity_at`, `expires_at_ms`). Never clears
    /// an eviction.
    async fn update_session(&self, session: &AuthSession) -> AuthResult<()>;

    async fn evict_sessions(
        &self,
        session_ids: &[AuthSessionId],
        evicted_at: DateTime<Utc>,
    ) -> AuthResult<u64>;

    async fn delete_session(&self, session_id: AuthSessionId) -> AuthResult<()>;

    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Everything the auth use cases and handlers need from storage.
pub trait AuthStore:
    AccountRepository
    + VerificationTokenRepository
    + RegistrationUnitOfWork
    + AuthSessionRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: AccountRepository
        + VerificationTokenRepository
        + RegistrationUnitOfWork
        + AuthSessionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
