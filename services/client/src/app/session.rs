//! services/client/src/app/session.rs
//!
//! The explicitly-scoped session context: hydrated from the store at
//! startup, written at login, cleared at logout or on any 401.

use infradoc_core::domain::{Credential, DocumentSummary, Session, UserProfile};
use infradoc_core::gate::{self, AuthState, Decision, Route};
use infradoc_core::ports::{AuthService, PortError, PortResult, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ClientError;

pub struct SessionContext {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn SessionStore>,
    session: Option<Session>,
    /// Documents fetched under this session. Dropped whenever it ends.
    documents: Vec<DocumentSummary>,
    dev_fallback: bool,
}

impl SessionContext {
    /// Reads the persisted session. Anything unreadable starts signed out.
    pub fn hydrate(auth: Arc<dyn AuthService>, store: Arc<dyn SessionStore>) -> Self {
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Could not load session; starting signed out");
                None
            }
        };
        Self {
            auth,
            store,
            session,
            documents: Vec::new(),
            dev_fallback: false,
        }
    }

    /// Enables the local credential table for network failures during login.
    /// Has no effect unless built with the `dev-fallback` feature.
    pub fn with_dev_fallback(mut self, enabled: bool) -> Self {
        self.dev_fallback = enabled;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn state(&self) -> AuthState {
        AuthState::from_session(self.session.as_ref())
    }

    pub fn credential(&self) -> Credential {
        self.session
            .as_ref()
            .map(Session::credential)
            .unwrap_or_default()
    }

    pub fn resolve(&self, requested: Route) -> Decision {
        gate::resolve(self.state(), requested)
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn cache_documents(&mut self, documents: Vec<DocumentSummary>) {
        self.documents = documents;
    }

    /// Signs in and returns the landing route for the session's role.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Route, ClientError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Please fill in all fields".to_string(),
            ));
        }

        let grant = match self.auth.login(username, password).await {
            Ok(grant) => grant,
            Err(PortError::Network(reason)) if self.dev_fallback => {
                warn!(%reason, "Backend unreachable; trying the local development accounts");
                self.local_grant(username, password)
                    .ok_or(PortError::Network(reason))?
            }
            Err(e) => return Err(e.into()),
        };

        let session = Session::new(grant.token, grant.profile);
        self.store.save(&session)?;
        let role = session.role;
        info!(user = %session.profile.username, %role, "Signed in");
        self.session = Some(session);
        self.documents.clear();
        Ok(Route::landing(role))
    }

    #[cfg(feature = "dev-fallback")]
    fn local_grant(&self, username: &str, password: &str) -> Option<infradoc_core::LoginGrant> {
        crate::adapters::dev_login::dev_login(username, password)
    }

    #[cfg(not(feature = "dev-fallback"))]
    fn local_grant(&self, _username: &str, _password: &str) -> Option<infradoc_core::LoginGrant> {
        None
    }

    /// Tells the backend best-effort, then always clears locally.
    pub async fn logout(&mut self) -> Route {
        if let Some(session) = &self.session {
            if let Err(e) = self.auth.logout(&session.credential()).await {
                warn!(error = %e, "Remote logout failed; clearing the local session anyway");
            }
        }
        self.end("logout")
    }

    /// Ends the session after the backend rejected its credential.
    pub fn expire(&mut self) -> Route {
        self.end("session rejected by backend")
    }

    fn end(&mut self, reason: &str) -> Route {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Could not clear the stored session");
        }
        if self.session.take().is_some() {
            info!(%reason, "Signed out");
        }
        self.documents.clear();
        Route::Login
    }

    /// Passes a port result through, ending the session on a 401.
    pub fn observe<T>(&mut self, result: PortResult<T>) -> PortResult<T> {
        if let Err(e) = &result {
            if e.is_auth_failure() {
                self.expire();
            }
        }
        result
    }

    /// Re-reads the profile from `/auth/me` and persists it.
    pub async fn refresh_profile(&mut self) -> Result<UserProfile, ClientError> {
        let credential = self.credential();
        if !credential.is_present() {
            return Err(PortError::Unauthorized("Please login again".to_string()).into());
        }
        let result = self.auth.current_user(&credential).await;
        let profile = self.observe(result)?;
        if let Some(session) = self.session.as_mut() {
            session.profile = profile.clone();
            session.role = profile.role;
            self.store.save(session)?;
        }
        Ok(profile)
    }
}
