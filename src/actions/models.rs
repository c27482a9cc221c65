use serde::{Deserialize, Serialize};

/// A signed-up user, as stored under `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The Firebase uid; the document id rather than a stored field.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub techstack: Vec<String>,
    pub created_at: String,
    pub user_id: String,
    #[serde(rename = "type", default)]
    pub interview_type: String,
    #[serde(default)]
    pub finalised: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpParams {
    pub uid: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInParams {
    pub email: String,
    pub id_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestInterviewsParams {
    pub user_id: String,
    #[serde(default = "default_latest_limit")]
    pub limit: i32,
}

impl GetLatestInterviewsParams {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            limit: default_latest_limit(),
        }
    }
}

fn default_latest_limit() -> i32 {
    20
}

/// Data behind the landing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub user: Option<User>,
    pub user_interviews: Vec<Interview>,
    pub latest_interviews: Vec<Interview>,
}

/// Document body written on sign-up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub created_at: String,
}
