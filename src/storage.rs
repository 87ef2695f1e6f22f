//! String key-value slots backing the board, modelled on browser local storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{BoardError, Result};

pub const TASKS_KEY: &str = "tasks";
pub const SIDEBAR_KEY: &str = "showSideBar";
pub const THEME_KEY: &str = "light-theme";
pub const ACTIVE_BOARD_KEY: &str = "activeBoard";

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &BTreeMap<String, String> {
        &self.items
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.items.clear();
        Ok(())
    }
}

/// All slots live in one JSON object on disk, rewritten whole on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStore {
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let items = if path.exists() {
            let raw = fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|source| BoardError::Corrupt {
                    key: path.display().to_string(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!(keys = items.len(), "opened storage file");
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `items` to disk and only then adopts them as the current state.
    fn commit(&mut self, items: BTreeMap<String, String>) -> Result<()> {
        debug!(file = %self.path.display(), keys = items.len(), "writing storage file");
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, &items)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        self.items = items;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.clone();
        items.insert(key.to_string(), value.to_string());
        self.commit(items)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut items = self.items.clone();
        items.remove(key);
        self.commit(items)
    }

    fn clear(&mut self) -> Result<()> {
        self.commit(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_across_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set_item(SIDEBAR_KEY, "false").unwrap();
        store.set_item(THEME_KEY, "enabled").unwrap();
        store.remove_item(THEME_KEY).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item(SIDEBAR_KEY).unwrap().as_deref(), Some("false"));
        assert_eq!(reopened.get_item(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn failed_write_leaves_items_unchanged() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("data");
        let mut store = FileStore::open(&dir.join("storage.json")).unwrap();
        store.set_item(TASKS_KEY, "[]").unwrap();

        fs::remove_dir_all(&dir).unwrap();
        assert!(store.set_item(TASKS_KEY, "[1]").is_err());
        assert!(store.remove_item(TASKS_KEY).is_err());
        assert!(store.clear().is_err());
        assert_eq!(store.get_item(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, BoardError::Corrupt { .. }));
    }

    #[test]
    fn memory_store_clear_drops_everything() {
        let mut store = MemoryStore::new();
        store.set_item(TASKS_KEY, "[]").unwrap();
        store.clear().unwrap();
        assert!(store.items().is_empty());
    }
}
