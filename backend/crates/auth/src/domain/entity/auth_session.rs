//! Auth Session Entity
//!
//! Server-side session, referenced from a signed cookie. Carries a snapshot
//! of the principal (account id, email, role) so authorization never needs
//! to load the account.

use chrono::{DateTime, Duration, Utc};
use kernel::id::AuthSessionId;

use crate::domain::entity::account::Account;
use crate::domain::value_object::{account_id::AccountId, email::Email, user_role::UserRole};

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: AuthSessionId,
    pub account_id: AccountId,
    pub email: Email,
    pub role: UserRole,
    /// Sliding expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Set when the concurrent-session cap pushed this session out
    pub evicted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(account: &Account, idle_ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            session_id: AuthSessionId::new(),
            account_id: account.account_id,
            email: account.email.clone(),
            role: account.role,
            expires_at_ms: expiry_ms(now, idle_ttl),
            evicted_at: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at_ms
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted_at.is_some()
    }

    /// Record activity and slide the expiry forward.
    pub fn touch(&mut self, now: DateTime<Utc>, idle_ttl: Duration) {
        self.last_activity_at = now;
        self.expires_at_ms = expiry_ms(now, idle_ttl);
    }

    pub fn evict(&mut self, now: DateTime<Utc>) {
        self.evicted_at.get_or_insert(now);
    }
}

/// `now + idle_ttl` in Unix ms, saturating on overflow.
fn expiry_ms(now: DateTime<Utc>, idle_ttl: Duration) -> i64 {
    now.checked_add_signed(idle_ttl)
        .map_or(i64::MAX, |at| at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::account::NewAccount;
    use crate::domain::value_object::{
        person_name::PersonName,
        user_password::{RawPassword, UserPassword},
    };

    fn session_at(now: DateTime<Utc>) -> AuthSession {
        let raw = RawPassword::new("secret123".to_string()).unwrap();
        let account = NewAccount::new(
            PersonName::first_name("Jane").unwrap(),
            PersonName::last_name("Doe").unwrap(),
            Email::new("jane@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
        .into_account(AccountId::from_db(1), now);
        AuthSession::new(&account, Duration::minutes(30), now)
    }

    #[test]
    fn test_expiry_and_sliding_touch() {
        let now = Utc::now();
        let mut session = session_at(now);

        assert!(!session.is_expired_at(now + Duration::minutes(29)));
        assert!(session.is_expired_at(now + Duration::minutes(30)));

        session.touch(now + Duration::minutes(20), Duration::minutes(30));
        assert!(!session.is_expired_at(now + Duration::minutes(45)));
        assert!(session.is_expired_at(now + Duration::minutes(50)));
    }

    #[test]
    fn test_huge_idle_ttl_saturates() {
        let now = Utc::now();
        let mut session = session_at(now);
        let ttl = Duration::seconds(10_000_000_000_000);

        session.touch(now, ttl);
        assert_eq!(session.expires_at_ms, i64::MAX);
        assert!(!session.is_expired_at(now + Duration::days(365 * 100)));
    }

    #[test]
    fn test_evict_keeps_first_timestamp() {
        let now = Utc::now();
        let mut session = session_at(now);
        assert!(!session.is_evicted());

        session.evict(now);
        session.evict(now + Duration::minutes(1));
        assert_eq!(session.evicted_at, Some(now));
    }

    #[test]
    fn test_snapshot_of_principal() {
        let session = session_at(Utc::now());
        assert_eq!(session.email.as_str(), "jane@example.com");
        assert_eq!(session.role, UserRole::User);
    }
}
