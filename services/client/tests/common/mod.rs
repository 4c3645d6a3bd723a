//! services/client/tests/common/mod.rs
//!
//! Shared wiring for the integration tests: a gateway pointed at a wiremock
//! server and a session store inside a temp directory.

#![allow(dead_code)]

use client_lib::adapters::{FileSessionStore, HttpGateway};
use client_lib::app::{DocumentFetcher, SessionContext, UploadRunner};
use infradoc_core::domain::{Role, Session, UserProfile};
use infradoc_core::ports::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

pub struct Harness {
    pub server: MockServer,
    pub gateway: Arc<HttpGateway>,
    pub store: Arc<FileSessionStore>,
    _dir: TempDir,
}

impl Harness {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base = format!("{}/api", server.uri());
        let gateway = Arc::new(HttpGateway::new(&base, Duration::from_secs(5)).unwrap());
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
        Self {
            server,
            gateway,
            store,
            _dir: dir,
        }
    }

    /// Persists a session as if a previous run had logged in.
    pub fn sign_in(&self, role: Role, department: &str) {
        let profile = UserProfile {
            id: "7".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            role,
            department: department.to_string(),
            display_name: "Jane Doe".to_string(),
        };
        self.store
            .save(&Session::new("token-abc".to_string(), profile))
            .unwrap();
    }

    pub fn session(&self) -> SessionContext {
        SessionContext::hydrate(self.gateway.clone(), self.store.clone())
    }

    pub fn fetcher(&self) -> DocumentFetcher {
        DocumentFetcher::new(self.gateway.clone(), self.gateway.clone())
    }

    pub fn uploader(&self) -> UploadRunner {
        UploadRunner::new(self.gateway.clone(), self.gateway.clone())
    }
}
