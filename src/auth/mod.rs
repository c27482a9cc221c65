//! Firebase Authentication admin client.
//!
//! Covers the account lookups, session-cookie lifecycle and password-reset
//! emails TalkBotix needs, over the Identity Toolkit REST API.

pub mod keys;
pub mod models;
pub mod verifier;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::auth::models::{
    CreateSessionCookieRequest, CreateSessionCookieResponse, GetAccountInfoRequest,
    GetAccountInfoResponse, OobCodeRequest, UserRecord,
};
use crate::auth::verifier::{
    SessionClaims, SessionCookieVerifier, SessionVerifier, TokenVerificationError,
};
use crate::core::FirebaseErrorResponse;


const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/projects";

pub const MIN_SESSION_DURATION: Duration = Duration::from_secs(5 * 60);
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("User account is disabled")]
    UserDisabled,
    #[error("Session cookie has been revoked")]
    SessionRevoked,
    #[error("Session cookie verification failed: {0}")]
    TokenVerification(#[from] TokenVerificationError),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    base_url: String,
    verifier: Arc<dyn SessionVerifier>,
}

impl FirebaseAuth {
    pub fn new(client: ClientWithMiddleware, project_id: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/{}", IDENTITY_TOOLKIT_URL, project_id),
            verifier: Arc::new(SessionCookieVerifier::new(project_id)),
        }
    }

    /// Points the client at another Identity Toolkit endpoint, such as the
    /// Auth emulator, with a matching verifier.
    pub fn new_with_url(
        client: ClientWithMiddleware,
        base_url: String,
        verifier: Arc<dyn SessionVerifier>,
    ) -> Self {
        Self {
            client,
            base_url,
            verifier,
        }
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<reqwest::Response, AuthError> {
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response)
    }

    async fn get_account_info(&self, request: GetAccountInfoRequest) -> Result<UserRecord, AuthError> {
        let url = format!("{}/accounts:lookup", self.base_url);
        let result: GetAccountInfoResponse = self.post(&url, &request).await?.json().await?;

        result
            .users
            .and_then(|mut users| users.pop())
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn get_user(&self, uid: &str) -> Result<UserRecord, AuthError> {
        self.get_account_info(GetAccountInfoRequest {
            local_id: Some(vec![uid.to_string()]),
            ..Default::default()
        })
        .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, AuthError> {
        self.get_account_info(GetAccountInfoRequest {
            email: Some(vec![email.to_string()]),
            ..Default::default()
        })
        .await
    }

    /// Exchanges a client ID token for a session cookie that lives for
    /// `expires_in` (between 5 minutes and 2 weeks).
    pub async fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in: Duration,
    ) -> Result<String, AuthError> {
        if id_token.is_empty() {
            return Err(AuthError::InvalidArgument("ID token must be a non-empty string".into()));
        }
        if expires_in < MIN_SESSION_DURATION || expires_in > MAX_SESSION_DURATION {
            return Err(AuthError::InvalidArgument(format!(
                "Session duration must be between 5 minutes and 2 weeks, got {}s",
                expires_in.as_secs()
            )));
        }

        let url = format!("{}:createSessionCookie", self.base_url);
        let request = CreateSessionCookieRequest {
            id_token: id_token.to_string(),
            valid_duration: expires_in.as_secs().to_string(),
        };

        let result: CreateSessionCookieResponse = self.post(&url, &request).await?.json().await?;
        Ok(result.session_cookie)
    }

    /// Verifies a session cookie. With `check_revoked`, the owning account is
    /// also looked up so disabled users and revoked sessions are refused.
    pub async fn verify_session_cookie(
        &self,
        session_cookie: &str,
        check_revoked: bool,
    ) -> Result<SessionClaims, AuthError> {
        let claims = self.verifier.verify(session_cookie).await?;

        if check_revoked {
            let user = self.get_user(&claims.uid).await?;
            if user.disabled {
                return Err(AuthError::UserDisabled);
            }
            if user
                .tokens_valid_after()
                .is_some_and(|valid_since| claims.auth_time < valid_since)
            {
                return Err(AuthError::SessionRevoked);
            }
        }

        Ok(claims)
    }

    /// Asks Firebase to email a password-reset link to `email`.
    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/accounts:sendOobCode", self.base_url);
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET".to_string(),
            email: email.to_string(),
        };

        self.post(&url, &request).await?;
        debug!(email, "Password reset email requested");
        Ok(())
    }
}

/// Maps Identity Toolkit error codes onto the variants callers branch on.
async fn api_error(response: reqwest::Response) -> AuthError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let code = serde_json::from_str::<FirebaseErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or_default();
    // Messages look like "INVALID_ID_TOKEN" or "TOO_SHORT : detail".
    match code.split(':').next().map(str::trim).unwrap_or_default() {
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "USER_DISABLED" => AuthError::UserDisabled,
        "" => AuthError::ApiError(format!("{}: {}", status, text)),
        other => AuthError::ApiError(format!("{} ({})", other, status)),
    }
}
