//! services/client/src/app/state.rs
//!
//! The application context: configuration plus the adapters behind each
//! port, created once at startup and handed to every command.

use infradoc_core::ports::{AuthService, DocumentService, ProcessingService, SessionStore};
use std::sync::Arc;

use crate::adapters::{FileSessionStore, HttpGateway};
use crate::app::documents::DocumentFetcher;
use crate::app::session::SessionContext;
use crate::app::upload::UploadRunner;
use crate::config::Config;
use crate::error::ClientError;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub documents: Arc<dyn DocumentService>,
    pub processing: Arc<dyn ProcessingService>,
    pub store: Arc<dyn SessionStore>,
}

impl AppContext {
    /// Wires the HTTP gateway and the file session store.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let gateway = Arc::new(HttpGateway::from_config(&config)?);
        let store = Arc::new(FileSessionStore::new(config.session_path.clone()));
        Ok(Self {
            config: Arc::new(config),
            auth: gateway.clone(),
            documents: gateway.clone(),
            processing: gateway,
            store,
        })
    }

    /// Hydrates the session from the store.
    pub fn session(&self) -> SessionContext {
        SessionContext::hydrate(self.auth.clone(), self.store.clone())
            .with_dev_fallback(self.config.dev_fallback_login)
    }

    pub fn fetcher(&self) -> DocumentFetcher {
        DocumentFetcher::new(self.documents.clone(), self.processing.clone())
    }

    pub fn uploader(&self) -> UploadRunner {
        UploadRunner::new(self.documents.clone(), self.processing.clone())
    }
}
