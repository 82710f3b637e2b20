//! The Identity Store: single owner of the persisted session identity.
//!
//! Exactly two identifiers are persisted: the auth token and the guest cart
//! id. When a token is present it takes precedence; the guest id only exists
//! to support anonymous carts and is cleared once, right after a successful
//! login merge. All reads and writes go through this module so there is one
//! writer for the persisted state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted file exists but does not parse.
    #[error("corrupt identity file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// On-disk shape of the persisted identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_cart_id: Option<String>,
}

/// Backend for persisting the identity pair.
///
/// Implementations are simple whole-value load/save; the [`IdentityStore`]
/// serializes access.
pub trait IdentityStorage: Send + Sync {
    /// Load the persisted identity. A missing store yields the default
    /// (empty) identity, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read or parsed.
    fn load(&self) -> Result<PersistedIdentity, IdentityError>;

    /// Replace the persisted identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(&self, identity: &PersistedIdentity) -> Result<(), IdentityError>;
}

/// JSON-file storage, the default backend.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a file storage at the given path. The file (and parent
    /// directories) are created lazily on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStorage for FileStorage {
    fn load(&self) -> Result<PersistedIdentity, IdentityError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(PersistedIdentity::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, identity: &PersistedIdentity) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(identity)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// In-memory storage, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    cell: Mutex<PersistedIdentity>,
}

impl IdentityStorage for MemoryStorage {
    fn load(&self) -> Result<PersistedIdentity, IdentityError> {
        Ok(self
            .cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, identity: &PersistedIdentity) -> Result<(), IdentityError> {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = identity.clone();
        Ok(())
    }
}

struct IdentityState {
    token: Option<SecretString>,
    guest_cart_id: Option<String>,
}

struct IdentityStoreInner {
    storage: Box<dyn IdentityStorage>,
    state: RwLock<IdentityState>,
}

/// Process-wide store for the session identity.
///
/// Cheaply cloneable; all clones share the same state and storage. Mutations
/// persist immediately. A failing persist is logged and the in-memory state
/// kept, so the worst case is a session that does not survive restart.
#[derive(Clone)]
pub struct IdentityStore {
    inner: Arc<IdentityStoreInner>,
}

impl IdentityStore {
    /// Open the store, reading any persisted identity at startup.
    ///
    /// An unreadable or corrupt store is logged and treated as a fresh
    /// (anonymous, cartless) identity.
    #[must_use]
    pub fn open(storage: impl IdentityStorage + 'static) -> Self {
        let persisted = storage.load().unwrap_or_else(|err| {
            warn!(error = %err, "could not read persisted identity; starting fresh");
            PersistedIdentity::default()
        });

        Self {
            inner: Arc::new(IdentityStoreInner {
                storage: Box::new(storage),
                state: RwLock::new(IdentityState {
                    token: persisted.token.map(SecretString::from),
                    guest_cart_id: persisted.guest_cart_id,
                }),
            }),
        }
    }

    /// The current auth token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// Store a freshly granted auth token.
    pub fn set_token(&self, token: &str) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.token = Some(SecretString::from(token.to_string()));
        self.persist(&state);
    }

    /// Drop the auth token (logout or session expiry).
    pub fn clear_token(&self) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.token = None;
        self.persist(&state);
    }

    /// The current guest cart id, if one exists. Never creates one.
    #[must_use]
    pub fn guest_id(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .guest_cart_id
            .clone()
    }

    /// The guest cart id, generating and persisting a fresh one on first use.
    #[must_use]
    pub fn get_or_create_guest_id(&self) -> String {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = &state.guest_cart_id {
            return existing.clone();
        }
        let fresh = uuid::Uuid::new_v4().to_string();
        state.guest_cart_id = Some(fresh.clone());
        self.persist(&state);
        fresh
    }

    /// Drop the guest cart id. Called exactly once, after a successful
    /// login/signup merge.
    pub fn clear_guest_id(&self) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.guest_cart_id = None;
        self.persist(&state);
    }

    fn persist(&self, state: &IdentityState) {
        let snapshot = PersistedIdentity {
            token: state
                .token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            guest_cart_id: state.guest_cart_id.clone(),
        };
        if let Err(err) = self.inner.storage.save(&snapshot) {
            warn!(error = %err, "failed to persist session identity");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("aba-identity-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_guest_id_created_once_and_reused() {
        let store = IdentityStore::open(MemoryStorage::default());
        assert!(store.guest_id().is_none());

        let first = store.get_or_create_guest_id();
        let second = store.get_or_create_guest_id();
        assert_eq!(first, second);
        assert_eq!(store.guest_id(), Some(first));
    }

    #[test]
    fn test_clear_guest_id() {
        let store = IdentityStore::open(MemoryStorage::default());
        let _ = store.get_or_create_guest_id();
        store.clear_guest_id();
        assert!(store.guest_id().is_none());
    }

    #[test]
    fn test_token_lifecycle() {
        let store = IdentityStore::open(MemoryStorage::default());
        assert!(store.token().is_none());

        store.set_token("tok-abc");
        assert_eq!(store.token().unwrap().expose_secret(), "tok-abc");

        store.clear_token();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let path = temp_path();
        let storage = FileStorage::new(&path);

        // Missing file loads as default
        assert!(storage.load().unwrap().token.is_none());

        {
            let store = IdentityStore::open(FileStorage::new(&path));
            store.set_token("tok-persisted");
            let _ = store.get_or_create_guest_id();
        }

        // A fresh store over the same file sees the persisted values
        let reopened = IdentityStore::open(FileStorage::new(&path));
        assert_eq!(reopened.token().unwrap().expose_secret(), "tok-persisted");
        assert!(reopened.guest_id().is_some());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let path = temp_path();
        std::fs::write(&path, "{ not json").unwrap();

        let store = IdentityStore::open(FileStorage::new(&path));
        assert!(store.token().is_none());
        assert!(store.guest_id().is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
