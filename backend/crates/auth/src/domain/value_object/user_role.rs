use serde::{Deserialize, Serialize};
use std::fmt;

/// The single authorization grant carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserRole {
    #[default]
    User = 0,
    PremiumUser = 1,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::PremiumUser => "premium_user",
        }
    }

    /// Authority name as used in access rules.
    #[inline]
    pub const fn authority(&self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::PremiumUser => "ROLE_PREMIUM_USER",
        }
    }

    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            UserRole::User => "Standard user",
            UserRole::PremiumUser => "Premium user",
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(UserRole::User),
            1 => Some(UserRole::PremiumUser),
            _ => None,
        }
    }

    /// Accepts either the code (`premium_user`) or the authority
    /// (`ROLE_PREMIUM_USER`), case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let value = value.strip_prefix("role_").unwrap_or(&value);
        match value {
            "user" => Some(UserRole::User),
            "premium_user" => Some(UserRole::PremiumUser),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
