//! Persistent key/value storage for client preferences.
//!
//! - Web: `localStorage`
//! - Native: one JSON file per key in the platform config directory:
//!   - Linux: `~/.config/teamspace/`
//!   - macOS: `~/Library/Application Support/teamspace/`
//!   - Windows: `%APPDATA%\teamspace\`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string storage keyed by name.
pub trait PreferenceStorage: Send + Sync {
    fn load_raw(&self, key: &str) -> Option<String>;
    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// Serialize `value` as JSON under `key`.
pub fn save<T: Serialize>(
    storage: &dyn PreferenceStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.save_raw(key, &json)
}

/// Load a JSON value. Missing keys and unreadable values both yield `None`.
pub fn load<T: DeserializeOwned>(storage: &dyn PreferenceStorage, key: &str) -> Option<T> {
    let json = storage.load_raw(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            crate::log_warn!("ignoring unreadable stored value for {}: {}", key, e);
            None
        }
    }
}

/// Storage for the current platform.
///
/// On native targets this falls back to [`MemoryStorage`] when no config
/// directory can be determined.
pub fn platform_storage() -> Arc<dyn PreferenceStorage> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(LocalStorage)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        match FileStorage::default_location() {
            Some(storage) => Arc::new(storage),
            None => {
                crate::log_warn!("no config directory; preferences will not persist");
                Arc::new(MemoryStorage::default())
            }
        }
    }
}

/// In-process storage for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStorage for MemoryStorage {
    fn load_raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }
}

// =========================================
// Web (WASM) implementation
// =========================================

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
impl PreferenceStorage for LocalStorage {
    fn load_raw(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok()?
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = local_storage()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".into()))?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

// =========================================
// Native implementation
// =========================================

/// JSON files in a directory, one per key.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/teamspace`
    pub fn default_location() -> Option<Self> {
        Some(Self::new(dirs::config_dir()?.join("teamspace")))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn file_path(&self, key: &str) -> std::path::PathBuf {
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(format!("{safe_key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStorage for FileStorage {
    fn load_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_path(key)).ok()
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.file_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.file_path(key));
    }
}
