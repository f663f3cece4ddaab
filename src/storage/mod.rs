//! Durable key-value storage
//!
//! Persisted console state (the credential, the settings draft) is stored as
//! one JSON document per namespace. Backends:
//!
//! - [`FileStore`]: `<dir>/<namespace>.json`
//! - [`KeyringStore`]: one OS keyring entry per namespace
//! - [`MemoryStore`]: process-local, used by tests

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Namespace of the persisted credential.
pub const AUTH_NAMESPACE: &str = "auth-storage";

/// Namespace of the persisted settings draft.
pub const SETTINGS_NAMESPACE: &str = "instance-settings-storage";

/// Keyring service name.
const KEYRING_SERVICE: &str = "zapconsole";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt entry '{namespace}': {message}")]
    Corrupt { namespace: String, message: String },

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Unknown storage backend '{0}' (expected file, keyring or memory)")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A namespaced JSON document store.
pub trait KvStore: Send + Sync {
    /// Read a namespace; `None` when nothing was ever written.
    fn load(&self, namespace: &str) -> Result<Option<Value>>;

    /// Replace a namespace's document.
    fn save(&self, namespace: &str, value: &Value) -> Result<()>;

    /// Delete a namespace. Removing a missing entry is not an error.
    fn remove(&self, namespace: &str) -> Result<()>;

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}

impl dyn KvStore + '_ {
    /// Load and decode a namespace.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>> {
        match self.load(namespace)? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                StorageError::Corrupt {
                    namespace: namespace.to_string(),
                    message: e.to_string(),
                }
            }),
            None => Ok(None),
        }
    }

    /// Encode and save a namespace.
    pub fn put<T: Serialize>(&self, namespace: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| StorageError::Corrupt {
            namespace: namespace.to_string(),
            message: e.to_string(),
        })?;
        self.save(namespace, &value)
    }
}

fn check_namespace(namespace: &str) -> Result<()> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidNamespace(namespace.to_string()))
    }
}

/// Default data directory: `<data_local_dir>/zapconsole`.
pub fn default_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zapconsole")
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// JSON files under a directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", namespace))
    }

    fn io(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl KvStore for FileStore {
    fn load(&self, namespace: &str) -> Result<Option<Value>> {
        check_namespace(namespace)?;
        let path = self.path(namespace);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io(&path, e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })
    }

    fn save(&self, namespace: &str, value: &Value) -> Result<()> {
        check_namespace(namespace)?;
        fs::create_dir_all(&self.dir).map_err(|e| Self::io(&self.dir, e))?;

        let path = self.path(namespace);
        let tmp = self.dir.join(format!(".{}.json.tmp", namespace));
        let contents = serde_json::to_string_pretty(value).map_err(|e| StorageError::Corrupt {
            namespace: namespace.to_string(),
            message: e.to_string(),
        })?;
        fs::write(&tmp, contents).map_err(|e| Self::io(&tmp, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
                .map_err(|e| Self::io(&tmp, e))?;
        }

        fs::rename(&tmp, &path).map_err(|e| Self::io(&path, e))?;
        tracing::debug!("Saved {} to {}", namespace, path.display());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        check_namespace(namespace)?;
        let path = self.path(namespace);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io(&path, e)),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// ---------------------------------------------------------------------------
// Keyring backend
// ---------------------------------------------------------------------------

/// OS keyring (Keychain, Secret Service, Credential Manager).
#[derive(Debug, Clone, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(namespace: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, namespace)
            .map_err(|e| StorageError::Keyring(e.to_string()))
    }
}

impl KvStore for KeyringStore {
    fn load(&self, namespace: &str) -> Result<Option<Value>> {
        check_namespace(namespace)?;
        match Self::entry(namespace)?.get_password() {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    namespace: namespace.to_string(),
                    message: e.to_string(),
                }),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }

    fn save(&self, namespace: &str, value: &Value) -> Result<()> {
        check_namespace(namespace)?;
        Self::entry(namespace)?
            .set_password(&value.to_string())
            .map_err(|e| StorageError::Keyring(e.to_string()))
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        check_namespace(namespace)?;
        match Self::entry(namespace)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }

    fn backend(&self) -> &'static str {
        "keyring"
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

/// In-process store. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn load(&self, namespace: &str) -> Result<Option<Value>> {
        check_namespace(namespace)?;
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(namespace).cloned())
    }

    fn save(&self, namespace: &str, value: &Value) -> Result<()> {
        check_namespace(namespace)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(namespace.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        check_namespace(namespace)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(namespace);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Open the configured backend.
pub fn open(backend: &str, dir: &Path) -> Result<Arc<dyn KvStore>> {
    match backend {
        "file" => Ok(Arc::new(FileStore::new(dir))),
        "keyring" => Ok(Arc::new(KeyringStore::new())),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(StorageError::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert!(store.load(AUTH_NAMESPACE).unwrap().is_none());
        store
            .save(AUTH_NAMESPACE, &json!({"token": "t", "role": "admin"}))
            .unwrap();
        assert_eq!(
            store.load(AUTH_NAMESPACE).unwrap(),
            Some(json!({"token": "t", "role": "admin"}))
        );
        assert!(dir.path().join("nested/auth-storage.json").exists());

        store.remove(AUTH_NAMESPACE).unwrap();
        assert!(store.load(AUTH_NAMESPACE).unwrap().is_none());
        store.remove(AUTH_NAMESPACE).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("auth-storage.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path());
        let err = store.load(AUTH_NAMESPACE).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryStore::new();
        store.save(AUTH_NAMESPACE, &json!(1)).unwrap();
        store.save(SETTINGS_NAMESPACE, &json!(2)).unwrap();
        store.remove(AUTH_NAMESPACE).unwrap();
        assert_eq!(store.load(SETTINGS_NAMESPACE).unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_rejects_path_like_namespaces() {
        let store = MemoryStore::new();
        assert!(store.save("../escape", &json!(1)).is_err());
        assert!(store.load("").is_err());
    }

    #[test]
    fn test_typed_helpers() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        store.put("numbers", &vec![1, 2, 3]).unwrap();
        let numbers: Option<Vec<u32>> = store.get("numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let wrong: std::result::Result<Option<String>, _> = store.get("numbers");
        assert!(wrong.is_err());
    }

    #[test]
    fn test_open_unknown_backend() {
        assert!(open("s3", Path::new(".")).is_err());
        assert_eq!(open("memory", Path::new(".")).unwrap().backend(), "memory");
    }
}
