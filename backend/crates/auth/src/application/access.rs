//! Access decisions for request paths.

use crate::domain::value_object::user_role::UserRole;

/// What a request path requires before it reaches a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Reachable without a session
    PermitAll,
    /// Any signed-in account
    Authenticated,
    /// A signed-in account holding one of these roles
    RequireRole(&'a [UserRole]),
}

impl Access<'_> {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Access::PermitAll)
    }

    pub fn allows(&self, role: UserRole) -> bool {
        match self {
            Access::PermitAll | Access::Authenticated => true,
            Access::RequireRole(roles) => roles.contains(&role),
        }
    }
}

/// Matches `/prefix/**` against the prefix itself and anything below it;
/// any other pattern must match exactly.
pub(crate) fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/**") {
        Some(prefix) => {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => pattern == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/resources/**", "/resources/css/app.css"));
        assert!(path_matches("/resources/**", "/resources"));
        assert!(!path_matches("/resources/**", "/resourcesx/app.css"));
        assert!(path_matches("/dashboard", "/dashboard"));
        assert!(!path_matches("/dashboard", "/dashboard/x"));
    }

    #[test]
    fn test_role_access() {
        let premium = [UserRole::PremiumUser];
        let access = Access::RequireRole(&premium);
        assert!(access.requires_session());
        assert!(access.allows(UserRole::PremiumUser));
        assert!(!access.allows(UserRole::User));
        assert!(!Access::PermitAll.requires_session());
    }
}
