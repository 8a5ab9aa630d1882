//! Runtime settings
//!
//! Read from the process environment (after `.env` is loaded). Every
//! setting has a development default except `DATABASE_URL`, and
//! `SESSION_SECRET` in release builds.

use anyhow::{Context, bail};
use auth::config::{AuthConfig, RegistrationMail, SameSite, SecurityRoutes};
use platform::mail::SmtpSettings;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub bind_addr: SocketAddr,
    pub public_base_url: String,
    pub static_dir: PathBuf,
    /// `None` when SMTP credentials are missing; mail is logged instead.
    pub smtp: Option<SmtpSettings>,
    pub auth: AuthConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` returns the raw value of a variable; empty counts as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env = Env(lookup);

        let database = DatabaseSettings {
            url: env
                .get("DATABASE_URL")
                .context("DATABASE_URL must be set in environment")?,
            max_connections: env.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            min_connections: env.parse_or("DATABASE_MIN_CONNECTIONS", 1)?,
            acquire_timeout: Duration::from_secs(env.parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?),
            idle_timeout: Duration::from_secs(env.parse_or("DATABASE_IDLE_TIMEOUT_SECS", 600)?),
            max_lifetime: Duration::from_secs(env.parse_or("DATABASE_MAX_LIFETIME_SECS", 1800)?),
        };

        let bind_addr = env.parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let public_base_url = env
            .get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let static_dir = PathBuf::from(env.get("STATIC_DIR").unwrap_or_else(|| "static".to_string()));

        let smtp = match (env.get("SMTP_USERNAME"), env.get("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpSettings {
                host: env
                    .get("SMTP_HOST")
                    .unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: env.parse_or("SMTP_PORT", 587)?,
                username,
                password,
            }),
            _ => None,
        };

        let auth = auth_config(&env, &public_base_url)?;

        Ok(Self {
            database,
            bind_addr,
            public_base_url,
            static_dir,
            smtp,
            auth,
        })
    }
}

fn auth_config<F>(env: &Env<F>, public_base_url: &str) -> anyhow::Result<AuthConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = AuthConfig::default();
    let route_defaults = SecurityRoutes::default();
    let mail_defaults = RegistrationMail::default();

    let session_secret = match env.get("SESSION_SECRET") {
        Some(encoded) => {
            let bytes = platform::crypto::from_base64(&encoded)
                .context("SESSION_SECRET must be base64")?;
            <[u8; 32]>::try_from(bytes.as_slice())
                .ok()
                .context("SESSION_SECRET must decode to 32 bytes")?
        }
        None if cfg!(debug_assertions) => {
            tracing::warn!("SESSION_SECRET not set, using a random secret for this run");
            platform::crypto::random_secret()
        }
        None => bail!("SESSION_SECRET must be set in production"),
    };

    let cookie_same_site = match env.get("SESSION_COOKIE_SAME_SITE") {
        Some(value) => SameSite::parse(&value)
            .with_context(|| format!("SESSION_COOKIE_SAME_SITE: unknown policy {value}"))?,
        None => defaults.cookie_same_site,
    };

    // Zero or negative means no limit
    let maximum_sessions: i64 = env.parse_or("SECURITY_MAXIMUM_SESSIONS", 1)?;

    let routes = SecurityRoutes {
        login_page: env.get_or("SECURITY_LOGIN_PAGE", route_defaults.login_page),
        login_processing_url: env.get_or(
            "SECURITY_LOGIN_PROCESSING_URL",
            route_defaults.login_processing_url,
        ),
        default_success_url: env.get_or(
            "SECURITY_DEFAULT_SUCCESS_URL",
            route_defaults.default_success_url,
        ),
        login_failure_url: env.get_or(
            "SECURITY_LOGIN_FAILURE_URL",
            route_defaults.login_failure_url,
        ),
        logout_url: env.get_or("SECURITY_LOGOUT_URL", route_defaults.logout_url),
        logout_success_url: env.get_or(
            "SECURITY_LOGOUT_SUCCESS_URL",
            route_defaults.logout_success_url,
        ),
        session_expired_url: env.get_or(
            "SECURITY_SESSION_EXPIRED_URL",
            route_defaults.session_expired_url,
        ),
    };

    let registration_mail = RegistrationMail {
        subject: env.get_or("REGISTRATION_MAIL_SUBJECT", mail_defaults.subject),
        sender: env.get_or("REGISTRATION_MAIL_FROM", mail_defaults.sender),
        confirmation_url_template: format!("{public_base_url}/auth/activate?token={{token}}"),
    };

    Ok(AuthConfig {
        session_secret,
        session_idle_ttl: env.lifetime_or("SESSION_IDLE_TIMEOUT_SECS", defaults.session_idle_ttl)?,
        cookie_secure: public_base_url.starts_with("https://"),
        cookie_same_site,
        password_pepper: env.get("PASSWORD_PEPPER").map(String::into_bytes),
        token_live_time: env.lifetime_or("REGISTRATION_TOKEN_LIVE_TIME", defaults.token_live_time)?,
        maximum_sessions: usize::try_from(maximum_sessions).ok().filter(|&n| n > 0),
        routes,
        registration_mail,
        ..defaults
    })
}

/// Upper bound for configured token and session lifetimes (ten years)
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn get_or(&self, key: &str, default: String) -> String {
        self.get(key).unwrap_or(default)
    }

    fn parse_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("{key}: invalid value {raw:?}: {e}")),
            None => Ok(default),
        }
    }

    /// Whole seconds in `1..=MAX_LIFETIME_SECS`.
    fn lifetime_or(&self, key: &str, default: Duration) -> anyhow::Result<Duration> {
        let secs: u64 = self.parse_or(key, default.as_secs())?;
        if !(1..=MAX_LIFETIME_SECS).contains(&secs) {
            bail!("{key}: must be between 1 and {MAX_LIFETIME_SECS} seconds, got {secs}");
        }
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_database_url_required() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[("DATABASE_URL", "postgres://localhost/dropjar")]).unwrap();

        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.bind_addr.port(), 8080);
        assert!(settings.smtp.is_none());
        assert_eq!(settings.auth.maximum_sessions, Some(1));
        assert_eq!(settings.auth.token_live_time, Duration::from_secs(86400));
        assert!(!settings.auth.cookie_secure);
        assert_eq!(
            settings.auth.registration_mail.confirmation_url_template,
            "http://localhost:8080/auth/activate?token={token}"
        );
    }

    #[test]
    fn test_overrides() {
        let secret = platform::crypto::to_base64(&[9u8; 32]);
        let settings = settings(&[
            ("DATABASE_URL", "postgres://localhost/dropjar"),
            ("PUBLIC_BASE_URL", "https://dropjar.example/"),
            ("SESSION_SECRET", secret.as_str()),
            ("REGISTRATION_TOKEN_LIVE_TIME", "3600"),
            ("SECURITY_MAXIMUM_SESSIONS", "-1"),
            ("SECURITY_LOGIN_FAILURE_URL", "/auth/sign-in?failed"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "app-password"),
        ])
        .unwrap();

        assert_eq!(settings.auth.session_secret, [9u8; 32]);
        assert_eq!(settings.auth.token_live_time, Duration::from_secs(3600));
        assert_eq!(settings.auth.maximum_sessions, None);
        assert_eq!(settings.auth.routes.login_failure_url, "/auth/sign-in?failed");
        assert!(settings.auth.cookie_secure);
        assert_eq!(
            settings.auth.registration_mail.confirmation_url_template,
            "https://dropjar.example/auth/activate?token={token}"
        );
        let smtp = settings.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username, "mailer");
    }

    #[test]
    fn test_bad_values_rejected() {
        let err = settings(&[
            ("DATABASE_URL", "postgres://localhost/dropjar"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));

        let err = settings(&[
            ("DATABASE_URL", "postgres://localhost/dropjar"),
            ("SESSION_SECRET", "c2hvcnQ="),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_lifetimes_bounded() {
        for key in ["REGISTRATION_TOKEN_LIVE_TIME", "SESSION_IDLE_TIMEOUT_SECS"] {
            for value in ["0", "10000000000000"] {
                let err = settings(&[("DATABASE_URL", "postgres://localhost/dropjar"), (key, value)])
                    .unwrap_err();
                assert!(err.to_string().contains(key), "{key}={value}: {err}");
            }
        }

        let settings = settings(&[
            ("DATABASE_URL", "postgres://localhost/dropjar"),
            ("SESSION_IDLE_TIMEOUT_SECS", "315360000"),
        ])
        .unwrap();
        assert_eq!(settings.auth.session_idle_ttl, Duration::from_secs(315_360_000));
    }
}
