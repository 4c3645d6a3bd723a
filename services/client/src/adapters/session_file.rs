//! services/client/src/adapters/session_file.rs
//!
//! A `SessionStore` that keeps the session as a JSON file, the CLI's
//! equivalent of browser-persisted storage.

use infradoc_core::domain::Session;
use infradoc_core::ports::{PortError, PortResult, SessionStore};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    /// A missing or unreadable file is simply "no session".
    fn load(&self) -> PortResult<Option<Session>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read session file");
                return Ok(None);
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.trim().is_empty() => Ok(Some(session)),
            Ok(_) => {
                warn!(path = %self.path.display(), "Stored session has an empty token");
                Ok(None)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unparsable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PortError::Unexpected(format!("create session dir: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| PortError::Unexpected(format!("write session file: {}", e)))?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!("remove session file: {}", e))),
        }
    }
}
