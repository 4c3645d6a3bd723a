//! crates/infradoc_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client depends on.
//! These traits form the boundary of the hexagonal architecture, so the
//! session, library and upload logic never touch HTTP or the filesystem
//! directly.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{
    Credential, DocumentQuery, LoginGrant, ProcessingReport, ProcessingSummary, Registration,
    Session, UserProfile, UserUpdate,
};
use crate::upload::UploadFile;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Each variant is one entry of the client's error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// No response at all (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),
    /// The backend rejected the credential. Carries its message.
    #[error("{0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Authentication failures end the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, PortError::Unauthorized(_))
    }

    /// Maps a non-success HTTP status and the backend's `error` message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => PortError::Unauthorized(message),
            403 => PortError::Forbidden(message),
            404 => PortError::NotFound(message),
            400 | 422 => PortError::Validation(message),
            _ => PortError::Server { status, message },
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Transfer Types
//=========================================================================================

/// Upload progress callback, called with a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// A download is either the file itself or a URL the backend redirects to.
#[derive(Debug, Clone, PartialEq)]
pub enum Download {
    Bytes {
        filename: Option<String>,
        data: Bytes,
    },
    Redirect {
        url: String,
        filename: Option<String>,
    },
}

/// Form fields sent alongside each uploaded file.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub department: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// What the storage endpoint returns for one committed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub message: String,
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    /// The stored document record, in its raw library shape.
    pub document: Option<Value>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Backend liveness; returns the service's self-reported status.
    async fn health(&self) -> PortResult<String>;

    async fn login(&self, username: &str, password: &str) -> PortResult<LoginGrant>;

    async fn register(&self, registration: &Registration) -> PortResult<UserProfile>;

    async fn logout(&self, credential: &Credential) -> PortResult<()>;

    async fn current_user(&self, credential: &Credential) -> PortResult<UserProfile>;

    async fn departments(&self) -> PortResult<Vec<String>>;

    async fn categories(&self) -> PortResult<Vec<String>>;

    // --- Administration ---
    async fn list_users(&self, credential: &Credential) -> PortResult<Vec<UserProfile>>;

    async fn update_user(
        &self,
        credential: &Credential,
        user_id: &str,
        update: &UserUpdate,
    ) -> PortResult<UserProfile>;
}

/// The document library endpoints. Listings come back as raw records; the
/// `normalize` module turns them into `DocumentSummary` values.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn list_documents(
        &self,
        credential: &Credential,
        query: &DocumentQuery,
    ) -> PortResult<Vec<Value>>;

    async fn get_document(&self, credential: &Credential, document_id: &str) -> PortResult<Value>;

    async fn download(&self, credential: &Credential, document_id: &str) -> PortResult<Download>;

    /// Sends one file as a multipart request, reporting progress while the
    /// body streams.
    async fn upload(
        &self,
        credential: &Credential,
        file: &UploadFile,
        options: &UploadOptions,
        progress: ProgressFn,
    ) -> PortResult<UploadReceipt>;
}

#[async_trait]
pub trait ProcessingService: Send + Sync {
    async fn department_documents(
        &self,
        credential: &Credential,
        department: &str,
    ) -> PortResult<Vec<Value>>;

    async fn document_result(&self, credential: &Credential, document_id: &str)
        -> PortResult<Value>;

    async fn trigger_processing(
        &self,
        credential: &Credential,
        department: Option<&str>,
    ) -> PortResult<ProcessingReport>;

    async fn processing_summary(&self, credential: &Credential) -> PortResult<ProcessingSummary>;

    async fn storage_listing(
        &self,
        credential: &Credential,
        department: Option<&str>,
    ) -> PortResult<Vec<Value>>;

    async fn process_stored(&self, credential: &Credential, storage_key: &str)
        -> PortResult<Value>;
}

/// Persistence for the single process-wide session.
pub trait SessionStore: Send + Sync {
    /// Returns `Ok(None)` when nothing usable is stored.
    fn load(&self) -> PortResult<Option<Session>>;

    fn save(&self, session: &Session) -> PortResult<()>;

    fn clear(&self) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_onto_the_taxonomy() {
        assert_eq!(
            PortError::from_status(401, "Invalid credentials".into()),
            PortError::Unauthorized("Invalid credentials".into())
        );
        assert_eq!(
            PortError::from_status(401, "Invalid credentials".into()).to_string(),
            "Invalid credentials"
        );
        assert!(matches!(PortError::from_status(403, "no".into()), PortError::Forbidden(_)));
        assert!(matches!(PortError::from_status(404, "gone".into()), PortError::NotFound(_)));
        assert!(matches!(PortError::from_status(400, "bad".into()), PortError::Validation(_)));
        assert_eq!(
            PortError::from_status(502, "upstream".into()),
            PortError::Server {
                status: 502,
                message: "upstream".into()
            }
        );
    }

    #[test]
    fn only_unauthorized_counts_as_auth_failure() {
        assert!(PortError::Unauthorized("expired".into()).is_auth_failure());
        assert!(!PortError::Forbidden("admin only".into()).is_auth_failure());
    }
}
