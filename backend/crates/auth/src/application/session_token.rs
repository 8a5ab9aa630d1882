//! Session Token
//!
//! Cookie value format: `"<session uuid>.<base64url(HMAC-SHA256(uuid))>"`.
//! The signature only proves the id was issued by this server; the session
//! row remains the source of truth.

use kernel::id::AuthSessionId;
use platform::crypto;

use crate::error::{AuthError, AuthResult};

pub fn sign(secret: &[u8], session_id: AuthSessionId) -> AuthResult<String> {
    let id = session_id.to_string();
    let tag = crypto::hmac_sha256(secret, id.as_bytes())
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(format!("{}.{}", id, crypto::to_base64_url(&tag)))
}

/// `None` for anything malformed or not signed with `secret`.
pub fn verify(secret: &[u8], token: &str) -> Option<AuthSessionId> {
    let (id, signature_b64) = token.split_once('.')?;
    let signature = crypto::from_base64_url(signature_b64).ok()?;

    if !crypto::verify_hmac_sha256(secret, id.as_bytes(), &signature) {
        return None;
    }

    id.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn test_sign_and_verify() {
        let session_id = AuthSessionId::new();
        let token = sign(&SECRET, session_id).unwrap();

        assert!(token.starts_with(&session_id.to_string()));
        assert_eq!(verify(&SECRET, &token), Some(session_id));
    }

    #[test]
    fn test_rejects_tampering() {
        let session_id = AuthSessionId::new();
        let token = sign(&SECRET, session_id).unwrap();

        // Another id with the original signature
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", AuthSessionId::new(), signature);
        assert_eq!(verify(&SECRET, &forged), None);

        // Other secret
        assert_eq!(verify(&[8u8; 32], &token), None);

        assert_eq!(verify(&SECRET, "no-dot"), None);
        assert_eq!(verify(&SECRET, &format!("{session_id}.!!!")), None);
    }
}
