//! Persisted session records.
//!
//! The store keeps the serialized identity and credential across reloads:
//! read on bootstrap, written on login, cleared on logout. The session
//! layer treats an absent or unreadable record as "no session".

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::TillError;
use crate::session::Identity;
use crate::settings::Settings;

/// The record persisted between application launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub identity: Identity,
    pub credential: String,
}

pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when no record exists. An error means a record exists but
    /// could not be read; callers should clear it and proceed anonymously.
    fn load(&self) -> Result<Option<PersistedSession>, TillError>;
    fn save(&self, session: &PersistedSession) -> Result<(), TillError>;
    fn clear(&self) -> Result<(), TillError>;
}

/// JSON-on-disk store at the path from `Settings`.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.session.store_path.clone())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, TillError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&contents)?;
        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), TillError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TillError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-process store for tests and embedders that do not persist sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, TillError> {
        Ok(self
            .record
            .lock()
            .map_err(|_| TillError::Store("session store mutex poisoned".into()))?
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), TillError> {
        *self
            .record
            .lock()
            .map_err(|_| TillError::Store("session store mutex poisoned".into()))? =
            Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TillError> {
        *self
            .record
            .lock()
            .map_err(|_| TillError::Store("session store mutex poisoned".into()))? = None;
        Ok(())
    }
}
