//! Credential storage
//!
//! [`CredentialStore`] owns the session's [`CredentialPair`]. The in-memory
//! copy is authoritative for the process and every change is written through
//! to a [`KeyValueStorage`] backend under two fixed keys.
//!
//! All operations are synchronous so that a refresh outcome can be stored and
//! handed to waiting callers without a suspension point in between.

use super::types::CredentialPair;
use etcetera::{choose_base_strategy, BaseStrategy};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Persistent string key/value storage
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    /// Write all items in one step
    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()>;

    fn remove_items(&self, keys: &[&str]) -> io::Result<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()> {
        (**self).set_items(items)
    }

    fn remove_items(&self, keys: &[&str]) -> io::Result<()> {
        (**self).remove_items(keys)
    }
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()> {
        let mut map = self.items.lock();
        for (key, value) in items {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> io::Result<()> {
        let mut map = self.items.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON object file storage
///
/// The whole object is rewritten through a temporary file and renamed into
/// place on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`, reading existing items if it exists
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let items = match std::fs::read(&path) {
            Ok(content) if content.is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_slice(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };

        debug!("Opened credential file: {}", path.display());
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Platform data location, e.g. `~/.local/share/abel/credentials.json`
    pub fn default_path() -> io::Result<PathBuf> {
        let strategy = choose_base_strategy()
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;
        Ok(strategy.data_dir().join("abel").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_vec_pretty(items)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> io::Result<()> {
        let mut map = self.items.lock();
        for (key, value) in items {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.flush(&map)
    }

    fn remove_items(&self, keys: &[&str]) -> io::Result<()> {
        let mut map = self.items.lock();
        for key in keys {
            map.remove(*key);
        }
        self.flush(&map)
    }
}

/// Holder of the session credential pair
pub struct CredentialStore {
    current: RwLock<Option<CredentialPair>>,
    backend: Box<dyn KeyValueStorage>,
}

impl CredentialStore {
    /// Store without persistence
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    /// Store backed by `backend`, seeded from what it already holds
    ///
    /// A pair is only restored when both keys are present.
    pub fn open(backend: impl KeyValueStorage + 'static) -> Self {
        let restored = match (
            backend.get_item(ACCESS_TOKEN_KEY),
            backend.get_item(REFRESH_TOKEN_KEY),
        ) {
            (Ok(Some(access)), Ok(Some(refresh))) => Some(CredentialPair::new(access, refresh)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to read stored credentials: {}", e);
                None
            }
            _ => None,
        };

        if restored.is_some() {
            debug!("Restored stored credentials");
        }

        Self {
            current: RwLock::new(restored),
            backend: Box::new(backend),
        }
    }

    pub fn get(&self) -> Option<CredentialPair> {
        self.current.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .map(|pair| pair.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the pair
    pub fn set(&self, pair: CredentialPair) {
        let mut current = self.current.write();
        if let Err(e) = self.backend.set_items(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ]) {
            warn!("Failed to persist credentials: {}", e);
        }
        *current = Some(pair);
    }

    /// Remove both tokens
    pub fn clear(&self) {
        let mut current = self.current.write();
        if let Err(e) = self
            .backend
            .remove_items(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
        {
            warn!("Failed to remove stored credentials: {}", e);
        }
        *current = None;
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
