//! Host capabilities the api client depends on.
//!
//! In a browser these are `localStorage` and `window.location`; here they
//! are traits so the client runs (and is tested) without a browser.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use url::Url;

use crate::{debug, log};

// ============================================================================
// Storage
// ============================================================================

/// Persistent string key/value storage.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str);
}

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<FxHashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with one item.
    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.items.lock().insert(key.to_owned(), value.to_owned());
        storage
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.items.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The file is read on every access so separate processes see each other's
/// writes (a `login` followed by an `edit`, for instance).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> io::Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(io::Error::other),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    fn save(&self, items: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items).map_err(io::Error::other)?;
        let mut file = open_private(&self.path)?;
        file.write_all(json.as_bytes())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        match self.load() {
            Ok(mut items) => items.remove(key),
            Err(e) => {
                log!("error"; "cannot read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        let _guard = self.lock.lock();
        let mut items = self.load()?;
        items.insert(key.to_owned(), value.to_owned());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) {
        let _guard = self.lock.lock();
        let result = self.load().and_then(|mut items| {
            if items.remove(key).is_some() {
                self.save(&items)?;
                debug!("storage"; "removed `{}` from {}", key, self.path.display());
            }
            Ok(())
        });
        if let Err(e) = result {
            log!("error"; "cannot update {}: {}", self.path.display(), e);
        }
    }
}

/// The file holds a bearer token: owner read/write only.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten an older file before writing.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}

// ============================================================================
// Navigation
// ============================================================================

/// Page navigation (the `window.location` assignment).
pub trait Navigator: Send + Sync {
    /// Leave the current page for `location` (usually a site-relative path).
    fn navigate(&self, location: &str);
}

/// Terminal stand-in: tells the user where to sign in again.
#[derive(Debug, Clone)]
pub struct LogNavigator {
    base_url: Url,
}

impl LogNavigator {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        let target = self
            .base_url
            .join(location)
            .map_or_else(|_| location.to_owned(), String::from);
        log!("auth"; "session expired, sign in again: {}", target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::with_item("access_token", "abc");
        assert_eq!(storage.get_item("access_token").as_deref(), Some("abc"));

        storage.remove_item("access_token");
        assert_eq!(storage.get_item("access_token"), None);

        // Removing twice is fine.
        storage.remove_item("access_token");
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let storage = FileStorage::new(&path);

        assert_eq!(storage.get_item("access_token"), None);
        storage.set_item("access_token", "tok").unwrap();
        storage.set_item("other", "kept").unwrap();

        // A second handle on the same file sees the write.
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("access_token").as_deref(), Some("tok"));

        reopened.remove_item("access_token");
        assert_eq!(storage.get_item("access_token"), None);
        assert_eq!(storage.get_item("other").as_deref(), Some("kept"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        FileStorage::new(&path).set_item("access_token", "t").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FileStorage::new(&path).set_item("access_token", "t").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            FileStorage::new(&path).get_item("access_token").as_deref(),
            Some("t")
        );
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get_item("access_token"), None);
        assert!(storage.set_item("access_token", "t").is_err());
    }
}
