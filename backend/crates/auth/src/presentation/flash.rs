//! Flash messages
//!
//! A one-shot payload carried across a redirect in a short-lived cookie:
//! `"<base64url(JSON)>.<base64url(HMAC-SHA256(payload))>"`, signed with the
//! session secret. The sign-in page reads it and clears the cookie.

use axum::http::{HeaderMap, HeaderValue};
use platform::cookie::{CookieConfig, extract_cookie, set_cookie_header};
use platform::crypto;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Success notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error banner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Email of a just-activated account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Email submitted with a failed sign-in, to repopulate the form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

impl Flash {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    fn encode(&self, secret: &[u8]) -> String {
        let payload = crypto::to_base64_url(&serde_json::to_vec(self).unwrap_or_default());
        // HMAC takes keys of any length; a zero tag never verifies
        let tag = crypto::hmac_sha256(secret, payload.as_bytes()).unwrap_or_default();
        format!("{payload}.{}", crypto::to_base64_url(&tag))
    }

    fn decode(value: &str, secret: &[u8]) -> Option<Self> {
        let (payload, tag) = value.split_once('.')?;
        let tag = crypto::from_base64_url(tag).ok()?;
        if !crypto::verify_hmac_sha256(secret, payload.as_bytes(), &tag) {
            return None;
        }

        let bytes = crypto::from_base64_url(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

pub fn set_flash_header(config: &CookieConfig, secret: &[u8], flash: &Flash) -> HeaderValue {
    set_cookie_header(config, &flash.encode(secret))
}

/// Read the flash cookie. A malformed or unsigned value is treated as absent.
pub fn read_flash(headers: &HeaderMap, config: &CookieConfig, secret: &[u8]) -> Option<Flash> {
    extract_cookie(headers, &config.name).and_then(|value| Flash::decode(&value, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    const SECRET: [u8; 32] = [3u8; 32];

    fn cookie_headers(pair: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn test_flash_cookie_is_read_back() {
        let config = CookieConfig::named("dropjar_flash");
        let flash = Flash {
            login: Some("jane@example.com".to_string()),
            error: Some("Invalid email or password".to_string()),
            ..Flash::default()
        };

        let set_cookie = set_flash_header(&config, &SECRET, &flash);
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();

        assert_eq!(read_flash(&cookie_headers(&pair), &config, &SECRET), Some(flash));
    }

    #[test]
    fn test_tampered_flash_is_ignored() {
        let config = CookieConfig::named("dropjar_flash");
        let set_cookie = set_flash_header(&config, &SECRET, &Flash::message("Your account is active."));
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let (_, tag) = pair.split_once('.').unwrap();

        // Forged payload with the original signature
        let forged = crypto::to_base64_url(br#"{"error":"<script>"}"#);
        let forged = format!("dropjar_flash={forged}.{tag}");
        assert_eq!(read_flash(&cookie_headers(&forged), &config, &SECRET), None);

        // Unsigned payload
        let unsigned = crypto::to_base64_url(br#"{"message":"hi"}"#);
        let unsigned = format!("dropjar_flash={unsigned}");
        assert_eq!(read_flash(&cookie_headers(&unsigned), &config, &SECRET), None);

        // Other secret
        assert_eq!(read_flash(&cookie_headers(&pair), &config, &[4u8; 32]), None);
    }

    #[test]
    fn test_malformed_flash_is_ignored() {
        let config = CookieConfig::named("dropjar_flash");
        let headers = cookie_headers("dropjar_flash=%%%");

        assert_eq!(read_flash(&headers, &config, &SECRET), None);
    }
}
