//! Persisted client session.
//!
//! The session is a flat string key/value map that survives restarts and is
//! wiped on logout. Components never touch storage directly; they receive a
//! [`SessionStore`] and read a [`SessionSnapshot`] from it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;
use thiserror::Error;

use crate::claims::decode_claims;
use crate::types::{LifecycleStatus, Principal, Role};

pub const AUTH_TOKEN: &str = "authToken";
pub const USER_ROLE: &str = "userRole";
pub const STATUS: &str = "status";
pub const IS_LOGGED_IN: &str = "isLoggedIn";
pub const PROFILE_COMPLETED: &str = "profileCompleted";

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value storage backing the session
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: &str) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave the map half-written.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process store; contents are lost when dropped
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        lock(&self.entries).clear();
        Ok(())
    }
}

/// Store persisted as a JSON object in `<dir>/session.json`.
///
/// The file is read once on open and rewritten after every mutation.
#[derive(Debug)]
pub struct FileSessionStore {
    file: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let file = dir.join(SESSION_FILE);
        let entries = if file.exists() {
            let content = fs::read_to_string(&file)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };

        tracing::debug!("Opened session file {} ({} keys)", file.display(), entries.len());

        Ok(Self {
            file,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.file, content)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut entries = lock(&self.entries);
        entries.clear();
        if self.file.exists() {
            fs::remove_file(&self.file)?;
        }
        Ok(())
    }
}

/// Point-in-time view of the persisted session fields.
///
/// Missing or unparseable values are `None`; reading a snapshot never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub role: Option<Role>,
    pub status: Option<LifecycleStatus>,
    pub logged_in: bool,
    pub profile_completed: Option<bool>,
}

impl SessionSnapshot {
    pub fn load(store: &dyn SessionStore) -> Self {
        Self {
            token: store.get(AUTH_TOKEN).filter(|t| !t.is_empty()),
            role: store.get(USER_ROLE).as_deref().and_then(Role::parse),
            status: store.get(STATUS).as_deref().and_then(LifecycleStatus::parse),
            logged_in: store.get(IS_LOGGED_IN).as_deref() == Some("true"),
            profile_completed: store.get(PROFILE_COMPLETED).map(|v| v == "true"),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Assemble the principal, decoding the tenant id from the token claims
    pub fn principal(&self) -> Principal {
        let tenant_id = self
            .token
            .as_deref()
            .and_then(decode_claims)
            .and_then(|claims| claims.school_id);

        Principal {
            token: self.token.clone(),
            role: self.role,
            tenant_id,
            lifecycle_status: self.status,
        }
    }
}

/// Login payload returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Persist a freshly issued session, replacing whatever was stored before
pub fn establish(store: &dyn SessionStore, login: &LoginResponse) -> Result<(), SessionError> {
    store.clear()?;
    store.set(AUTH_TOKEN, &login.token)?;
    store.set(USER_ROLE, &login.role)?;
    store.set(IS_LOGGED_IN, "true")?;

    match login.status.as_deref() {
        Some(status) => {
            store.set(STATUS, status)?;
            let incomplete = status == LifecycleStatus::ProfileIncomplete.as_str();
            store.set(PROFILE_COMPLETED, if incomplete { "false" } else { "true" })?;
        }
        None => store.set(PROFILE_COMPLETED, "true")?,
    }

    tracing::info!("Session established for role {}", login.role);
    Ok(())
}

/// Reflect a lifecycle transition the server has just confirmed
pub fn record_status(store: &dyn SessionStore, status: LifecycleStatus) -> Result<(), SessionError> {
    store.set(STATUS, status.as_str())?;
    if status != LifecycleStatus::ProfileIncomplete {
        store.set(PROFILE_COMPLETED, "true")?;
    }
    tracing::debug!("Recorded lifecycle status {}", status);
    Ok(())
}

/// Destroy the session wholesale
pub fn logout(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.clear()?;
    tracing::info!("Session cleared");
    Ok(())
}
