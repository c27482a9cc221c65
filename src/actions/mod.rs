//! Server actions: the straight-line operations the web front end calls.
//!
//! Actions never return errors. Failures are logged and folded into an
//! [`ActionResult`] or an empty value, so callers only branch on outcomes.

pub mod auth;
pub mod general;
pub mod models;
pub mod session;


use serde::Serialize;

pub use self::models::{
    GetLatestInterviewsParams, HomeView, Interview, SignInParams, SignUpParams, User,
};
pub use self::session::SessionCookie;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// An action result that may also change the browser's session cookie.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub result: ActionResult,
    pub cookie: Option<SessionCookie>,
}
