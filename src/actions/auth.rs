use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use super::models::NewUser;
use super::{ActionResult, SessionCookie, SessionOutcome, SignInParams, SignUpParams, User};
use crate::auth::AuthError;
use crate::firestore::FirestoreError;
use crate::TalkBotix;

pub(crate) const USERS: &str = "users";

impl TalkBotix {
    /// Records a freshly registered account under `users/{uid}`.
    ///
    /// The Firebase account itself is created client-side; this only refuses
    /// a uid that already has a profile.
    pub async fn sign_up(&self, params: SignUpParams) -> ActionResult {
        let SignUpParams { uid, name, email } = params;
        if uid.is_empty() || name.is_empty() || email.is_empty() {
            return ActionResult::failure("Invalid input parameters");
        }

        match self.create_user_document(&uid, &name, &email).await {
            Ok(()) => {
                info!(%uid, %email, "Account created");
                ActionResult::success("Account created successfully. Please sign in.")
            }
            Err(FirestoreError::AlreadyExists(_)) => {
                debug!(%uid, "Sign-up for an existing user");
                ActionResult::failure("User already exists. Please sign in instead.")
            }
            Err(FirestoreError::InvalidDocumentId(_)) => {
                warn!(%uid, "Sign-up with an unusable uid");
                ActionResult::failure("Invalid input parameters")
            }
            Err(e) => {
                error!(%uid, %email, error = %e, "Sign-up failed");
                ActionResult::failure(format!("Failed to create an account: {e}"))
            }
        }
    }

    /// Fails with `AlreadyExists` when `users/{uid}` is already there,
    /// including when a concurrent sign-up wins the race.
    async fn create_user_document(
        &self,
        uid: &str,
        name: &str,
        email: &str,
    ) -> Result<(), FirestoreError> {
        self.firestore()
            .collection(USERS)
            .doc(uid)?
            .create(&NewUser {
                name,
                email,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            })
            .await
    }

    /// Exchanges the client's ID token for a session cookie, provided an
    /// account exists for `email`.
    pub async fn sign_in(&self, params: SignInParams) -> SessionOutcome {
        let SignInParams { email, id_token } = params;

        let cookie = match self.issue_session(&email, &id_token).await {
            Ok(cookie) => cookie,
            Err(AuthError::UserNotFound) => {
                debug!(%email, "Sign-in for unknown email");
                return SessionOutcome {
                    result: ActionResult::failure("User does not exist. Create an account instead."),
                    cookie: None,
                };
            }
            Err(e) => {
                error!(%email, error = %e, "Sign-in failed");
                return SessionOutcome {
                    result: ActionResult::failure(format!("Failed to log into an account: {e}")),
                    cookie: None,
                };
            }
        };

        info!(%email, "Signed in");
        SessionOutcome {
            result: ActionResult::success("Sign-in successful!"),
            cookie: Some(cookie),
        }
    }

    async fn issue_session(&self, email: &str, id_token: &str) -> Result<SessionCookie, AuthError> {
        self.auth().get_user_by_email(email).await?;

        let settings = self.session_settings();
        let value = self
            .auth()
            .create_session_cookie(id_token, settings.max_age)
            .await?;

        Ok(SessionCookie {
            value,
            max_age: settings.max_age,
            secure: settings.secure,
        })
    }

    /// Drops the browser's session. Firebase-side sessions are left alone.
    pub fn sign_out(&self) -> SessionOutcome {
        SessionOutcome {
            result: ActionResult::success("Signed out."),
            cookie: Some(SessionCookie::cleared(self.session_settings().secure)),
        }
    }

    /// Resolves the session cookie to the stored user.
    ///
    /// No cookie, a cookie that fails verification or revocation checks, and
    /// an account without a profile document all mean "nobody signed in".
    pub async fn get_current_user(&self, session_cookie: Option<&str>) -> Option<User> {
        let session_cookie = session_cookie.filter(|c| !c.is_empty())?;

        let claims = match self.auth().verify_session_cookie(session_cookie, true).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Rejected session cookie");
                return None;
            }
        };

        let lookup = async { self.firestore().collection(USERS).doc(&claims.uid)?.get().await };
        let snapshot = match lookup.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(uid = %claims.uid, error = %e, "Failed to load current user");
                return None;
            }
        };

        match snapshot.data::<User>() {
            Ok(Some(user)) => Some(User {
                id: snapshot.id().to_string(),
                ..user
            }),
            Ok(None) => {
                debug!(uid = %claims.uid, "Session for a user without a profile");
                None
            }
            Err(e) => {
                error!(uid = %claims.uid, error = %e, "Malformed user document");
                None
            }
        }
    }

    pub async fn is_authenticated(&self, session_cookie: Option<&str>) -> bool {
        self.get_current_user(session_cookie).await.is_some()
    }

    /// Has Firebase email a password-reset link.
    pub async fn reset_password(&self, email: &str) -> ActionResult {
        if email.is_empty() {
            return ActionResult::failure("Please enter a valid email address");
        }

        match self.auth().send_password_reset_email(email).await {
            Ok(()) => ActionResult::success(
                "Password reset email sent successfully. Check your inbox.",
            ),
            Err(AuthError::UserNotFound) => {
                ActionResult::failure("No user found with this email address.")
            }
            Err(AuthError::InvalidEmail) => ActionResult::failure("Invalid email address."),
            Err(e) => {
                error!(email, error = %e, "Password reset failed");
                ActionResult::failure(format!("Failed to send password reset email: {e}"))
            }
        }
    }
}
