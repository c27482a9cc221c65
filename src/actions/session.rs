//! The `session` cookie handed to browsers after sign-in.

use std::time::Duration;

pub const SESSION_COOKIE_NAME: &str = "session";

/// One week, the default session length.
pub const ONE_WEEK: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub value: String,
    pub max_age: Duration,
    pub secure: bool,
}

impl SessionCookie {
    /// A cookie that tells the browser to drop the session.
    pub fn cleared(secure: bool) -> Self {
        Self {
            value: String::new(),
            max_age: Duration::ZERO,
            secure,
        }
    }

    /// Renders the `Set-Cookie` header value: http-only, lax, site-wide.
    pub fn header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE_NAME,
            self.value,
            self.max_age.as_secs()
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Pulls the session value out of a `Cookie` request header.
pub fn session_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
