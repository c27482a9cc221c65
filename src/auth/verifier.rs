use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::keys::{KeyFetchError, PublicKeyManager, SESSION_COOKIE_KEYS_URL};

/// Tolerated clock skew for `auth_time`, in seconds.
const AUTH_TIME_SKEW: i64 = 300;

#[derive(Error, Debug)]
pub enum TokenVerificationError {
    #[error("Key fetch error: {0}")]
    KeyFetchError(#[from] KeyFetchError),
    #[error("JWT validation error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Claims carried by a verified session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub aud: String,
    pub iss: String,
    /// The Firebase uid.
    #[serde(rename = "sub")]
    pub uid: String,
    pub exp: i64,
    pub iat: i64,
    pub auth_time: i64,
    pub email: Option<String>,
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// Checks a session cookie's signature and standard claims.
///
/// Revocation is not part of this check; `FirebaseAuth` layers it on top.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, session_cookie: &str) -> Result<SessionClaims, TokenVerificationError>;
}

pub struct SessionCookieVerifier {
    project_id: String,
    key_manager: PublicKeyManager,
}

impl SessionCookieVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_keys_url(project_id, SESSION_COOKIE_KEYS_URL)
    }

    pub fn with_keys_url(project_id: impl Into<String>, keys_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            key_manager: PublicKeyManager::new(keys_url),
        }
    }

    fn issuer(&self) -> String {
        format!("https://session.firebase.google.com/{}", self.project_id)
    }
}

#[async_trait]
impl SessionVerifier for SessionCookieVerifier {
    async fn verify(&self, session_cookie: &str) -> Result<SessionClaims, TokenVerificationError> {
        let header = decode_header(session_cookie)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenVerificationError::InvalidToken(format!(
                "Unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| TokenVerificationError::InvalidToken("Missing kid in header".to_string()))?;

        let public_key_pem = self.key_manager.get_key(&kid).await?;
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let claims = decode::<SessionClaims>(session_cookie, &key, &validation)?.claims;

        if claims.uid.is_empty() {
            return Err(TokenVerificationError::InvalidToken(
                "Subject (sub) claim must not be empty".to_string(),
            ));
        }

        if claims.auth_time > chrono::Utc::now().timestamp() + AUTH_TIME_SKEW {
            return Err(TokenVerificationError::InvalidToken(
                "Auth time is in the future".to_string(),
            ));
        }

        Ok(claims)
    }
}
