//! Environment-driven configuration.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use http::HeaderValue;
use thiserror::Error;
use tracing::info;
use yup_oauth2::ServiceAccountKey;

use crate::SessionSettings;

const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub port: u16,
    pub production: bool,
    pub session_days: u64,
    /// Browser origin allowed to call the API with credentials. Unset means
    /// same-origin only.
    pub allowed_origin: Option<HeaderValue>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            project_id: required(&lookup, "FIREBASE_PROJECT_ID")?,
            client_email: required(&lookup, "FIREBASE_CLIENT_EMAIL")?,
            // Keys pasted into env files usually carry literal "\n" sequences.
            private_key: required(&lookup, "FIREBASE_PRIVATE_KEY")?.replace(r"\n", "\n"),
            private_key_id: lookup("FIREBASE_PRIVATE_KEY_ID"),
            port: try_load(&lookup, "TALKBOTIX_PORT", "3000")?,
            production: lookup("TALKBOTIX_ENV").is_some_and(|env| env == "production"),
            session_days: try_load(&lookup, "TALKBOTIX_SESSION_DAYS", "7")?,
            allowed_origin: allowed_origin(&lookup)?,
        };

        if !(1..=14).contains(&config.session_days) {
            return Err(ConfigError::Invalid {
                key: "TALKBOTIX_SESSION_DAYS",
                reason: "must be between 1 and 14 days".to_string(),
            });
        }

        Ok(config)
    }

    pub fn service_account_key(&self) -> ServiceAccountKey {
        ServiceAccountKey {
            key_type: Some("service_account".to_string()),
            project_id: Some(self.project_id.clone()),
            private_key_id: self.private_key_id.clone(),
            private_key: self.private_key.clone(),
            client_email: self.client_email.clone(),
            client_id: None,
            auth_uri: None,
            token_uri: TOKEN_URI.to_string(),
            auth_provider_x509_cert_url: None,
            client_x509_cert_url: None,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_age: Duration::from_secs(self.session_days * 24 * 60 * 60),
            secure: self.production,
        }
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn allowed_origin<F>(lookup: &F) -> Result<Option<HeaderValue>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEY: &str = "TALKBOTIX_ALLOWED_ORIGIN";

    let Some(origin) = lookup(KEY).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let invalid = |reason: &str| ConfigError::Invalid {
        key: KEY,
        reason: reason.to_string(),
    };

    // Credentialed CORS cannot use a wildcard.
    if origin == "*" {
        return Err(invalid("a wildcard origin cannot carry the session cookie"));
    }
    if !(origin.starts_with("https://") || origin.starts_with("http://")) {
        return Err(invalid("must be an http(s) origin"));
    }

    HeaderValue::from_str(origin.trim_end_matches('/'))
        .map(Some)
        .map_err(|e| invalid(&e.to_string()))
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
