use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::auth::verifier::{SessionClaims, SessionVerifier, TokenVerificationError};
use crate::auth::FirebaseAuth;
use crate::firestore::FirebaseFirestore;
use crate::{SessionSettings, TalkBotix};

pub const AUTH_PATH: &str = "/v1/projects/test-project";
pub const DOCUMENTS_PATH: &str = "/v1/projects/test-project/databases/(default)/documents";

/// Accepts exactly one cookie value and maps it to a uid.
pub struct StubVerifier {
    pub cookie: &'static str,
    pub uid: &'static str,
    pub auth_time: i64,
}

#[async_trait]
impl SessionVerifier for StubVerifier {
    async fn verify(&self, session_cookie: &str) -> Result<SessionClaims, TokenVerificationError> {
        if session_cookie != self.cookie {
            return Err(TokenVerificationError::InvalidToken("bad signature".to_string()));
        }
        Ok(SessionClaims {
            aud: "test-project".to_string(),
            iss: "https://session.firebase.google.com/test-project".to_string(),
            uid: self.uid.to_string(),
            exp: self.auth_time + 3600,
            iat: self.auth_time,
            auth_time: self.auth_time,
            email: None,
            claims: Default::default(),
        })
    }
}

pub fn plain_client() -> ClientWithMiddleware {
    ClientBuilder::new(Client::new()).build()
}

pub fn stub_verifier() -> Arc<StubVerifier> {
    Arc::new(StubVerifier {
        cookie: "valid-cookie",
        uid: "user-1",
        auth_time: 1_700_000_000,
    })
}

pub fn auth_for(server: &httpmock::MockServer) -> FirebaseAuth {
    FirebaseAuth::new_with_url(plain_client(), server.url(AUTH_PATH), stub_verifier())
}

pub fn firestore_for(server: &httpmock::MockServer) -> FirebaseFirestore {
    FirebaseFirestore::new_with_url(plain_client(), server.url(DOCUMENTS_PATH))
}

pub fn app_for(server: &httpmock::MockServer) -> TalkBotix {
    TalkBotix::from_parts(
        auth_for(server),
        firestore_for(server),
        SessionSettings::default(),
    )
}
