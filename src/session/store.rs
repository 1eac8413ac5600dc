use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;

use crate::models::Session;

/// File-backed store for the single session record
///
/// The session is written as plain JSON, not encrypted at rest. The file
/// path acts as the fixed storage key.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session, if any
    ///
    /// A missing, unreadable, or malformed file all answer `None`.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(
                    "Discarding malformed session file {}: {err}",
                    self.path.display()
                );
                None
            }
        }
    }

    /// Persist the full session, overwriting any prior value
    ///
    /// Write failures are logged and swallowed; the next `load` will simply
    /// find no session.
    pub fn save(&self, session: &Session) {
        let json = match serde_json::to_string_pretty(session) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize session: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, json) {
            warn!(
                "Failed to persist session to {}: {err}",
                self.path.display()
            );
        }
    }

    /// Remove the persisted session entirely
    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to clear session file {}: {err}",
                    self.path.display()
                );
            }
        }
    }

    /// True iff the session holds a token whose expiry is strictly in the
    /// future
    #[must_use]
    pub fn is_valid(session: &Session) -> bool {
        match (&session.access_token, session.token_expiry) {
            (Some(_), Some(expiry)) => Utc::now().timestamp_millis() < expiry,
            _ => false,
        }
    }
}
