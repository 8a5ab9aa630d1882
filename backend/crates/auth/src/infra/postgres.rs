//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AuthSessionId, VerificationTokenId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    account::{Account, NewAccount},
    auth_session::AuthSession,
    verification_token::VerificationToken,
};
use crate::domain::repository::{
    AccountRepository, AuthSessionRepository, Registration, RegistrationUnitOfWork,
    VerificationTokenRepository,
};
use crate::domain::value_object::{
    account_id::AccountId, email::Email, person_name::PersonName, user_password::UserPassword,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    first_name,
    last_name,
    email,
    password_hash,
    account_role,
    active,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    account_id,
    email,
    account_role,
    expires_at_ms,
    evicted_at,
    created_at,
    last_activity_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.cleanup_expired_sessions(Utc::now().timestamp_millis())
            .await
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn find_account_by_id(&self, account_id: AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1"
        ))
        .bind(account_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn find_account_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn account_exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

// ============================================================================
// Verification Token Repository Implementation
// ============================================================================

impl VerificationTokenRepository for PgAuthRepository {
    async fn find_token_by_id(
        &self,
        token_id: VerificationTokenId,
    ) -> AuthResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token_id, account_id, created_at, verified_at
            FROM verification_tokens
            WHERE token_id = $1
            "#,
        )
        .bind(token_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TokenRow::into_token))
    }
}

// ============================================================================
// Registration Unit of Work
// ============================================================================

impl RegistrationUnitOfWork for PgAuthRepository {
    async fn create_registration(
        &self,
        account: &NewAccount,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<Registration> {
        let mut tx = self.pool.begin().await?;

        let account_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (
                first_name,
                last_name,
                email,
                password_hash,
                account_role,
                active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            RETURNING account_id
            "#,
        )
        .bind(account.first_name.as_str())
        .bind(account.last_name.as_str())
        .bind(account.email.as_str())
        .bind(account.password_hash.as_phc_string())
        .bind(account.role.id())
        .bind(issued_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let account = account
            .clone()
            .into_account(AccountId::from_db(account_id), issued_at);
        let token = VerificationToken::issue(account.account_id, issued_at);

        sqlx::query(
            r#"
            INSERT INTO verification_tokens (token_id, account_id, created_at, verified_at)
            VALUES ($1, $2, $3, NULL)
            "#,
        )
        .bind(token.token_id.into_uuid())
        .bind(account_id)
        .bind(token.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Registration { account, token })
    }

    async fn save_verification(
        &self,
        account: &Account,
        token: &VerificationToken,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Conditional on the token still being unconsumed
        let consumed = sqlx::query(
            r#"
            UPDATE verification_tokens SET verified_at = $2
            WHERE token_id = $1 AND verified_at IS NULL
            "#,
        )
        .bind(token.token_id.into_uuid())
        .bind(token.verified_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if consumed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE accounts SET
                active = $2,
                updated_at = $3
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.value())
        .bind(account.active)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                account_id,
                email,
                account_role,
                expires_at_ms,
                evicted_at,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id.into_uuid())
        .bind(session.account_id.value())
        .bind(session.email.as_str())
        .bind(session.role.id())
        .bind(session.expires_at_ms)
        .bind(session.evicted_at)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: AuthSessionId) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1"
        ))
        .bind(session_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuthSessionRow::into_session).transpose()
    }

    async fn find_live_sessions_by_account(
        &self,
        account_id: AccountId,
        now_ms: i64,
    ) -> AuthResult<Vec<AuthSession>> {
        let rows = sqlx::query_as::<_, AuthSessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM auth_sessions
            WHERE account_id = $1 AND evicted_at IS NULL AND expires_at_ms > $2
            ORDER BY last_activity_at ASC, created_at ASC
            "#
        ))
        .bind(account_id.value())
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuthSessionRow::into_session).collect()
    }

    async fn update_session(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id.into_uuid())
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn evict_sessions(
        &self,
        session_ids: &[AuthSessionId],
        evicted_at: DateTime<Utc>,
    ) -> AuthResult<u64> {
        if session_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = session_ids.iter().map(|id| id.into_uuid()).collect();

        let evicted = sqlx::query(
            r#"
            UPDATE auth_sessions SET evicted_at = $2
            WHERE session_id = ANY($1) AND evicted_at IS NULL
            "#,
        )
        .bind(ids)
        .bind(evicted_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(evicted)
    }

    async fn delete_session(&self, session_id: AuthSessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.into_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self, now_ms: i64) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

fn map_unique_violation(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
        _ => AuthError::Database(e),
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    account_role: i16,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let password_hash = UserPassword::from_phc_string(self.password_hash)?;

        Ok(Account {
            account_id: AccountId::from_db(self.account_id),
            first_name: PersonName::from_db(self.first_name),
            last_name: PersonName::from_db(self.last_name),
            email: Email::from_db(self.email),
            password_hash,
            role: role_from_db(self.account_role)?,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token_id: Uuid,
    account_id: i32,
    created_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
}

impl TokenRow {
    fn into_token(self) -> VerificationToken {
        VerificationToken {
            token_id: VerificationTokenId::from_uuid(self.token_id),
            account_id: AccountId::from_db(self.account_id),
            created_at: self.created_at,
            verified_at: self.verified_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    account_id: i32,
    email: String,
    account_role: i16,
    expires_at_ms: i64,
    evicted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        Ok(AuthSession {
            session_id: AuthSessionId::from_uuid(self.session_id),
            account_id: AccountId::from_db(self.account_id),
            email: Email::from_db(self.email),
            role: role_from_db(self.account_role)?,
            expires_at_ms: self.expires_at_ms,
            evicted_at: self.evicted_at,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}

fn role_from_db(id: i16) -> AuthResult<UserRole> {
    UserRole::from_id(id).ok_or_else(|| AuthError::Internal(format!("Unknown account_role: {id}")))
}
