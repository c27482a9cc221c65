//! TalkBotix backend.
//!
//! TalkBotix is an AI mock-interview platform. This crate holds its server
//! side: the sign-up, sign-in and session actions, the interview queries the
//! landing page needs, thin Firebase Auth and Cloud Firestore REST clients
//! underneath them, and a JSON HTTP service exposing the actions.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), talkbotix::config::ConfigError> {
//! use talkbotix::{config::Config, TalkBotix};
//!
//! let app = TalkBotix::new(&Config::load()?);
//! let user = app.get_current_user(Some("session-cookie")).await;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod auth;
pub mod config;
pub mod core;
pub mod firestore;
pub mod server;

#[cfg(test)]
mod test_helpers;

use std::time::Duration;

use auth::FirebaseAuth;
use config::Config;
use firestore::FirebaseFirestore;
use tracing::info;

/// How session cookies are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub max_age: Duration,
    /// Send the cookie over HTTPS only.
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_age: actions::session::ONE_WEEK,
            secure: false,
        }
    }
}

/// The Firebase services behind TalkBotix, bundled with the session policy.
/// Actions are implemented as methods in the [`actions`] modules.
#[derive(Clone)]
pub struct TalkBotix {
    auth: FirebaseAuth,
    db: FirebaseFirestore,
    session: SessionSettings,
}

impl TalkBotix {
    pub fn new(config: &Config) -> Self {
        let client = core::build_client(config.service_account_key());
        info!(project_id = %config.project_id, "Firebase Admin clients initialized");

        Self {
            auth: FirebaseAuth::new(client.clone(), &config.project_id),
            db: FirebaseFirestore::new(client, &config.project_id),
            session: config.session_settings(),
        }
    }

    /// Assembles the app from pre-built clients, e.g. ones pointed at the
    /// Firebase emulators.
    pub fn from_parts(auth: FirebaseAuth, db: FirebaseFirestore, session: SessionSettings) -> Self {
        Self { auth, db, session }
    }

    pub fn auth(&self) -> &FirebaseAuth {
        &self.auth
    }

    pub fn firestore(&self) -> &FirebaseFirestore {
        &self.db
    }

    pub fn session_settings(&self) -> SessionSettings {
        self.session
    }
}
