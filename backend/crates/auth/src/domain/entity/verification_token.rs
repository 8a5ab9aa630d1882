//! Verification Token Entity
//!
//! Issued at signup and mailed as a link. Tokens are never deleted; a
//! consumed token keeps its `verified_at` stamp as an audit trail.

use chrono::{DateTime, Duration, Utc};
use kernel::id::VerificationTokenId;

use crate::domain::value_object::account_id::AccountId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub token_id: VerificationTokenId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    pub fn issue(account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            token_id: VerificationTokenId::new(),
            account_id,
            created_at: now,
            verified_at: None,
        }
    }

    /// Saturates at the end of representable time.
    pub fn expires_at(&self, live_time: Duration) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(live_time)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Strictly before `created_at + live_time`.
    pub fn is_live_at(&self, now: DateTime<Utc>, live_time: Duration) -> bool {
        now < self.expires_at(live_time)
    }

    pub fn is_consumed(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn consume(&mut self, now: DateTime<Utc>) {
        self.verified_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_boundary() {
        let issued = Utc::now();
        let token = VerificationToken::issue(AccountId::from_db(1), issued);
        let ttl = Duration::seconds(3600);

        assert!(token.is_live_at(issued, ttl));
        assert!(token.is_live_at(issued + Duration::seconds(3599), ttl));
        assert!(!token.is_live_at(issued + Duration::seconds(3600), ttl));
        assert!(!token.is_live_at(issued + Duration::seconds(3601), ttl));
    }

    #[test]
    fn test_huge_live_time_never_expires() {
        let issued = Utc::now();
        let token = VerificationToken::issue(AccountId::from_db(1), issued);
        let ttl = Duration::seconds(10_000_000_000_000);

        assert_eq!(token.expires_at(ttl), DateTime::<Utc>::MAX_UTC);
        assert!(token.is_live_at(issued + Duration::days(365 * 100), ttl));
    }

    #[test]
    fn test_consume_stamps_verified_at() {
        let issued = Utc::now();
        let mut token = VerificationToken::issue(AccountId::from_db(1), issued);
        assert!(!token.is_consumed());

        let at = issued + Duration::seconds(10);
        token.consume(at);
        assert!(token.is_consumed());
        assert_eq!(token.verified_at, Some(at));
    }
}
