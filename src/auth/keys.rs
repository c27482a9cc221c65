use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Certificates used to sign session cookies.
pub const SESSION_COOKIE_KEYS_URL: &str =
    "https://www.googleapis.com/identitytoolkit/v3/relyingparty/publicKeys";

const DEFAULT_MAX_AGE: u64 = 3600;

#[derive(Error, Debug)]
pub enum KeyFetchError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("No public key for kid {0}")]
    UnknownKey(String),
}

#[derive(Clone)]
struct CachedKeys {
    keys: HashMap<String, String>,
    expires_at: Instant,
}

/// Fetches the signing certificates and keeps them for as long as the
/// endpoint's `Cache-Control: max-age` allows.
pub struct PublicKeyManager {
    client: Client,
    url: String,
    cache: Arc<RwLock<Option<CachedKeys>>>,
}

impl PublicKeyManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn get_key(&self, kid: &str) -> Result<String, KeyFetchError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = &*cache {
                if Instant::now() < cached.expires_at {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Unknown kid or stale cache: keys may have rotated.
        self.refresh_keys().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.keys.get(kid).cloned())
            .ok_or_else(|| KeyFetchError::UnknownKey(kid.to_string()))
    }

    async fn refresh_keys(&self) -> Result<(), KeyFetchError> {
        debug!(url = %self.url, "Refreshing public keys");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_MAX_AGE);

        let keys: HashMap<String, String> = response.json().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedKeys {
            keys,
            expires_at: Instant::now() + Duration::from_secs(max_age),
        });

        Ok(())
    }
}

fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|part| {
        part.trim()
            .strip_prefix("max-age=")
            .and_then(|age| age.parse::<u64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("public, max-age=19845, must-revalidate"), Some(19845));
        assert_eq!(parse_max_age("no-cache"), None);
    }

    #[tokio::test]
    async fn test_keys_are_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/publicKeys");
            then.status(200)
                .header("cache-control", "public, max-age=600")
                .json_body(json!({ "kid-1": "pem-1", "kid-2": "pem-2" }));
        });

        let manager = PublicKeyManager::new(server.url("/publicKeys"));
        assert_eq!(manager.get_key("kid-1").await.unwrap(), "pem-1");
        assert_eq!(manager.get_key("kid-2").await.unwrap(), "pem-2");

        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_unknown_kid_refetches_then_fails() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/publicKeys");
            then.status(200).json_body(json!({ "kid-1": "pem-1" }));
        });

        let manager = PublicKeyManager::new(server.url("/publicKeys"));
        manager.get_key("kid-1").await.unwrap();
        let err = manager.get_key("rotated").await.unwrap_err();

        assert!(matches!(err, KeyFetchError::UnknownKey(kid) if kid == "rotated"));
        mock.assert_calls(2);
    }
}
