use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub local_id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Seconds since the epoch before which issued sessions are revoked.
    pub valid_since: Option<String>,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
}

impl UserRecord {
    pub fn tokens_valid_after(&self) -> Option<i64> {
        self.valid_since.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountInfoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountInfoResponse {
    pub users: Option<Vec<UserRecord>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionCookieRequest {
    pub id_token: String,
    /// Lifetime in seconds, sent as a string.
    pub valid_duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionCookieResponse {
    pub session_cookie: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OobCodeRequest {
    pub request_type: String,
    pub email: String,
}
