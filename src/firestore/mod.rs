//! Cloud Firestore module.
//!
//! A small REST client shaped after the Node.js Admin SDK: `collection()` and
//! `doc()` hand out references, references read and write documents, and
//! collections start structured queries.

pub mod models;
pub mod query;
pub mod reference;
pub mod snapshot;


use self::reference::CollectionReference;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Firestore API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The id cannot name a single document in the collection.
    #[error("Invalid document id: {0:?}")]
    InvalidDocumentId(String),
    /// A create-only write found the document already present.
    #[error("Document already exists: {0}")]
    AlreadyExists(String),
}

/// Client for interacting with Cloud Firestore.
#[derive(Clone)]
pub struct FirebaseFirestore {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseFirestore {
    /// Creates a client for the project's `(default)` database.
    pub fn new(client: ClientWithMiddleware, project_id: &str) -> Self {
        let base_url = FIRESTORE_V1_API.replace("{project_id}", project_id);
        Self { client, base_url }
    }

    /// Creates a client rooted at a custom documents URL (emulator, tests).
    pub fn new_with_url(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Gets a `CollectionReference` for a root collection (e.g. "users").
    pub fn collection(&self, collection_id: &str) -> CollectionReference<'_> {
        CollectionReference {
            client: &self.client,
            parent: self.base_url.clone(),
            collection_id: collection_id.to_string(),
        }
    }
}
