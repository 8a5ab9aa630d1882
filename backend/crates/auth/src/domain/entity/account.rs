//! Account Entity
//!
//! A registered user. Accounts start pending (`active == false`) and become
//! active exactly once, when a verification token is consumed. There is no
//! way back and accounts are never deleted.

use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};

use crate::domain::value_object::{
    account_id::AccountId, email::Email, person_name::PersonName, user_password::UserPassword,
    user_role::UserRole,
};

/// Validated signup data, before the database assigns an id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    pub password_hash: UserPassword,
    pub role: UserRole,
}

impl NewAccount {
    /// New accounts always get the standard role.
    pub fn new(
        first_name: PersonName,
        last_name: PersonName,
        email: Email,
        password_hash: UserPassword,
    ) -> Self {
        Self {
            first_name,
            last_name,
            email,
            password_hash,
            role: UserRole::default(),
        }
    }

    /// The persisted form, inactive.
    pub fn into_account(self, account_id: AccountId, now: DateTime<Utc>) -> Account {
        Account {
            account_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            active: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted account. Identity is the email address.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: AccountId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    pub password_hash: UserPassword,
    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Pending → Active. Returns `false` if the account was already active.
    pub fn activate(&mut self, now: DateTime<Utc>) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.updated_at = now;
        true
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;
    use std::collections::HashSet;

    fn account(id: i32, email: &str) -> Account {
        let raw = RawPassword::new("secret123".to_string()).unwrap();
        NewAccount::new(
            PersonName::first_name("Jane").unwrap(),
            PersonName::last_name("Doe").unwrap(),
            Email::new(email).unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
        .into_account(AccountId::from_db(id), Utc::now())
    }

    #[test]
    fn test_new_account_is_pending_standard_user() {
        let account = account(1, "jane@example.com");
        assert!(!account.active);
        assert_eq!(account.role, UserRole::User);
        assert_eq!(account.full_name(), "Jane Doe");
    }

    #[test]
    fn test_activate_is_one_way() {
        let mut account = account(1, "jane@example.com");
        let now = Utc::now();
        assert!(account.activate(now));
        assert!(account.active);
        assert!(!account.activate(now));
        assert!(account.active);
    }

    #[test]
    fn test_equality_by_email_only() {
        let a = account(1, "jane@example.com");
        let b = account(2, "JANE@example.com");
        let c = account(1, "john@example.com");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Account> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
