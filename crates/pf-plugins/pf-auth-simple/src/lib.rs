//! # pf-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles admin password verification and signed session tokens.
//!
//! A token is `base64url(JSON session) "." base64url(HMAC-SHA256(payload))`.
//! The payload stays readable, but it cannot be altered or forged without
//! the server's secret.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use pf_core::error::{AppError, Result};
use pf_core::models::Session;
use pf_core::traits::AuthProvider;
use pf_core::SESSION_TTL_DAYS;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    /// Key for signing session tokens
    session_secret: Vec<u8>,
}

impl SimpleAuthProvider {
    /// Accepts a secret (e.g., from an environment variable)
    pub fn new(secret: &[u8]) -> Self {
        Self {
            session_secret: secret.to_vec(),
        }
    }

    /// Secret that rotates on restart, logging every admin out.
    pub fn with_random_secret() -> Result<Self> {
        let mut secret = [0u8; 32];
        getrandom::getrandom(&mut secret)
            .map_err(|e| AppError::Internal(format!("no entropy for session secret: {e}")))?;
        Ok(Self::new(&secret))
    }

    fn sign(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.session_secret)
            .map_err(|e| AppError::Internal(format!("invalid session secret: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_session(&self, username: &str) -> Result<(String, Session)> {
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            issued_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&session)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload)?.finalize().into_bytes());
        Ok((format!("{payload}.{signature}"), session))
    }

    fn read_session(&self, token: &str) -> Option<Session> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        // Constant-time comparison.
        self.sign(payload).ok()?.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let session: Session = serde_json::from_slice(&json).ok()?;
        if session.is_expired(Utc::now()) {
            log::debug!("expired session for '{}'", session.username);
            return None;
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString};

    fn provider() -> SimpleAuthProvider {
        SimpleAuthProvider::new(b"test-secret")
    }

    fn forge(session: &Session, signer: &SimpleAuthProvider) -> String {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(session).unwrap());
        let signature = URL_SAFE_NO_PAD.encode(signer.sign(&payload).unwrap().finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    #[tokio::test]
    async fn test_password_verification() {
        let salt = SaltString::encode_b64(b"fixed-test-salt!").unwrap();
        let hash = Argon2::default()
            .hash_password(b"hunter2", &salt)
            .unwrap()
            .to_string();

        let auth = provider();
        assert!(auth.verify_password("hunter2", &hash).await);
        assert!(!auth.verify_password("hunter3", &hash).await);
        assert!(!auth.verify_password("hunter2", "not-a-phc-string").await);
    }

    #[test]
    fn test_issued_session_reads_back() {
        let auth = provider();
        let (token, session) = auth.issue_session("admin").unwrap();
        assert_eq!(session.expires_at - session.issued_at, Duration::days(7));
        assert_eq!(auth.read_session(&token), Some(session));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let auth = provider();
        let (token, session) = auth.issue_session("admin").unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let elevated = Session { username: "root".into(), ..session };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&elevated).unwrap());
        assert_eq!(auth.read_session(&format!("{payload}.{signature}")), None);
    }

    #[test]
    fn test_unsigned_base64_json_is_rejected() {
        let auth = provider();
        let (token, _) = auth.issue_session("admin").unwrap();
        let (payload, _) = token.split_once('.').unwrap();
        assert_eq!(auth.read_session(payload), None);
        assert_eq!(auth.read_session(""), None);
        assert_eq!(auth.read_session("a.b.c"), None);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let (token, _) = SimpleAuthProvider::new(b"other").issue_session("admin").unwrap();
        assert_eq!(provider().read_session(&token), None);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let auth = provider();
        let now = Utc::now();
        let stale = Session {
            username: "admin".into(),
            issued_at: now - Duration::days(8),
            expires_at: now - Duration::days(1),
        };
        assert_eq!(auth.read_session(&forge(&stale, &auth)), None);
    }
}
