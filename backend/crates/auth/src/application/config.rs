//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use kernel::id::VerificationTokenId;
use platform::cookie::CookieConfig;

use crate::application::access::{Access, path_matches};
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

// ============================================================================
// Routes
// ============================================================================

/// Where the session gate sends the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRoutes {
    pub login_page: String,
    pub login_processing_url: String,
    pub default_success_url: String,
    pub login_failure_url: String,
    pub logout_url: String,
    pub logout_success_url: String,
    pub session_expired_url: String,
}

impl Default for SecurityRoutes {
    fn default() -> Self {
        Self {
            login_page: "/auth/sign-in".to_string(),
            login_processing_url: "/auth/login".to_string(),
            default_success_url: "/dashboard".to_string(),
            login_failure_url: "/auth/sign-in?error".to_string(),
            logout_url: "/auth/logout".to_string(),
            logout_success_url: "/auth/sign-in?logout".to_string(),
            session_expired_url: "/auth/sign-in?expired".to_string(),
        }
    }
}

// ============================================================================
// Access Policy
// ============================================================================

/// Paths below `path_pattern` require one of `roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub path_pattern: String,
    pub roles: Vec<UserRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Patterns reachable without a session (`/prefix/**` or exact paths)
    pub permit_all: Vec<String>,
    /// First matching rule wins
    pub role_rules: Vec<RoleRule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            permit_all: vec!["/resources/**".to_string(), "/auth/**".to_string()],
            role_rules: Vec::new(),
        }
    }
}

impl AccessPolicy {
    pub fn access_for(&self, path: &str) -> Access<'_> {
        if self.permit_all.iter().any(|p| path_matches(p, path)) {
            return Access::PermitAll;
        }

        self.role_rules
            .iter()
            .find(|rule| path_matches(&rule.path_pattern, path))
            .map_or(Access::Authenticated, |rule| Access::RequireRole(&rule.roles))
    }
}

// ============================================================================
// Registration Mail
// ============================================================================

pub const TOKEN_PLACEHOLDER: &str = "{token}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationMail {
    pub subject: String,
    /// Mailbox, e.g. `DropJar <no-reply@dropjar.local>`
    pub sender: String,
    /// Absolute URL containing `{token}`
    pub confirmation_url_template: String,
}

impl Default for RegistrationMail {
    fn default() -> Self {
        Self {
            subject: "Confirm your DropJar account".to_string(),
            sender: "DropJar <no-reply@dropjar.local>".to_string(),
            confirmation_url_template: "http://localhost:8080/auth/activate?token={token}"
                .to_string(),
        }
    }
}

impl RegistrationMail {
    pub fn confirmation_url(&self, token_id: VerificationTokenId) -> String {
        self.confirmation_url_template
            .replace(TOKEN_PLACEHOLDER, &token_id.to_string())
    }
}

// ============================================================================
// Auth Config
// ============================================================================

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Sliding idle timeout of a session
    pub session_idle_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// How long a verification token can be consumed after issue
    pub token_live_time: Duration,
    /// Concurrent sessions per account; `None` means unlimited
    pub maximum_sessions: Option<usize>,
    /// One-shot message cookie carried across redirects
    pub flash_cookie_name: String,
    pub routes: SecurityRoutes,
    pub access: AccessPolicy,
    pub registration_mail: RegistrationMail,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "dropjar_session".to_string(),
            session_secret: [0u8; 32],
            session_idle_ttl: Duration::from_secs(30 * 60), // 30 minutes
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            token_live_time: Duration::from_secs(24 * 3600), // 1 day
            maximum_sessions: Some(1),
            flash_cookie_name: "dropjar_flash".to_string(),
            routes: SecurityRoutes::default(),
            access: AccessPolicy::default(),
            registration_mail: RegistrationMail::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::random_secret(),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            max_age_secs: i64::try_from(self.session_idle_ttl.as_secs()).ok(),
            ..CookieConfig::named(&self.session_cookie_name)
        }
    }

    pub fn flash_cookie(&self) -> CookieConfig {
        CookieConfig {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            max_age_secs: Some(60),
            ..CookieConfig::named(&self.flash_cookie_name)
        }
    }

    pub fn idle_ttl_chrono(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.session_idle_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))
    }

    pub fn token_live_time_chrono(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.token_live_time)
            .map_err(|e| AuthError::Internal(format!("Invalid token live time: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.access_for("/auth/sign-in"), Access::PermitAll);
        assert_eq!(policy.access_for("/resources/css/app.css"), Access::PermitAll);
        assert_eq!(policy.access_for("/dashboard"), Access::Authenticated);
        assert_eq!(policy.access_for("/"), Access::Authenticated);
    }

    #[test]
    fn test_role_rule() {
        let policy = AccessPolicy {
            role_rules: vec![RoleRule {
                path_pattern: "/premium/**".to_string(),
                roles: vec![UserRole::PremiumUser],
            }],
            ..AccessPolicy::default()
        };

        assert_eq!(
            policy.access_for("/premium/files"),
            Access::RequireRole(&[UserRole::PremiumUser])
        );
        assert_eq!(policy.access_for("/dashboard"), Access::Authenticated);
    }

    #[test]
    fn test_confirmation_url() {
        let mail = RegistrationMail::default();
        let token_id = VerificationTokenId::new();
        assert_eq!(
            mail.confirmation_url(token_id),
            format!("http://localhost:8080/auth/activate?token={token_id}")
        );
    }

    #[test]
    fn test_cookie_configs() {
        let config = AuthConfig::development();
        let session = config.session_cookie();
        assert_eq!(session.name, "dropjar_session");
        assert!(!session.secure);
        assert_eq!(session.max_age_secs, Some(1800));
        assert_eq!(config.flash_cookie().max_age_secs, Some(60));
        assert_ne!(config.session_secret, [0u8; 32]);
    }
}
