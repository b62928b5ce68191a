//! Key-value user preferences.
//!
//! Stores:
//! - `InMemoryPreferenceStore` (tests, headless use)
//! - `FilePreferenceStore` (JSON object on disk)
//! - `LocalStoragePreferenceStore` (browser `localStorage`, wasm32 only)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceError::StorageUnavailable => write!(f, "preference storage unavailable"),
            PreferenceError::Corrupt(msg) => write!(f, "preference storage corrupt: {msg}"),
            PreferenceError::Io(msg) => write!(f, "preference storage error: {msg}"),
        }
    }
}

impl std::error::Error for PreferenceError {}

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as one JSON object in a file.
///
/// The file is loaded once on open; every `set` rewrites it through a
/// sibling temp file and a rename.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferenceStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| PreferenceError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PreferenceError::Io(e.to_string())),
        };
        debug!("loaded {} preferences from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PreferenceError::Io(e.to_string()))?;
            }
        }
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| PreferenceError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| PreferenceError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| PreferenceError::Io(e.to_string()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{PreferenceError, PreferenceStore};

    #[derive(Debug)]
    pub struct LocalStoragePreferenceStore {
        storage: web_sys::Storage,
    }

    impl LocalStoragePreferenceStore {
        pub fn new() -> Result<Self, PreferenceError> {
            let win = web_sys::window().ok_or(PreferenceError::StorageUnavailable)?;
            let storage = win
                .local_storage()
                .map_err(|e| PreferenceError::Io(format!("localStorage error: {:?}", e)))?
                .ok_or(PreferenceError::StorageUnavailable)?;
            Ok(Self { storage })
        }
    }

    impl PreferenceStore for LocalStoragePreferenceStore {
        fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
            self.storage
                .get_item(key)
                .map_err(|e| PreferenceError::Io(format!("localStorage get failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
            self.storage
                .set_item(key, value)
                .map_err(|e| PreferenceError::Io(format!("localStorage set failed: {:?}", e)))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStoragePreferenceStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStoragePreferenceStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStoragePreferenceStore {
    pub fn new() -> Result<Self, PreferenceError> {
        Err(PreferenceError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for LocalStoragePreferenceStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PreferenceError> {
        Err(PreferenceError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PreferenceError> {
        Err(PreferenceError::StorageUnavailable)
    }
}
