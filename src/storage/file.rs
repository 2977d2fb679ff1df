//! File-based storage backend.

use crate::error::Result;
use crate::storage::traits::KeyValueStore;
use std::fs;
use std::io;
use std::path::PathBuf;

/// File-based storage backend with atomic writes.
///
/// Each key is one file under `<base_dir>/state/`.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a new file backend.
    ///
    /// Creates the state directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("state"))?;
        Ok(Self { base_dir })
    }

    /// Get the path to a key's file.
    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join("state").join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let temp = path.with_extension("tmp");

        fs::write(&temp, value)?;

        // Atomic rename - a crash mid-write leaves the previous value intact
        fs::rename(&temp, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_backend() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        (backend, temp_dir)
    }

    #[test]
    fn creates_state_directory() {
        let temp_dir = TempDir::new().unwrap();
        let _backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(temp_dir.path().join("state").exists());
    }

    #[test]
    fn get_missing_key() {
        let (store, _temp) = create_test_backend();
        assert!(store.get("floatChatHistory").unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let (store, _temp) = create_test_backend();
        store.set("floatChatActiveId", "chat_1").unwrap();
        assert_eq!(
            store.get("floatChatActiveId").unwrap().as_deref(),
            Some("chat_1")
        );
    }

    #[test]
    fn set_overwrites_previous_value() {
        let (store, _temp) = create_test_backend();
        store.set("floatChatActiveId", "chat_1").unwrap();
        store.set("floatChatActiveId", "chat_2").unwrap();
        assert_eq!(
            store.get("floatChatActiveId").unwrap().as_deref(),
            Some("chat_2")
        );
    }

    #[test]
    fn atomic_write_creates_no_temp_file() {
        let (store, temp_dir) = create_test_backend();
        store.set("floatChatHistory", "{}").unwrap();

        let state_dir = temp_dir.path().join("state");
        assert!(!state_dir.join("floatChatHistory.tmp").exists());
        assert!(state_dir.join("floatChatHistory.json").exists());
    }

    #[test]
    fn remove_deletes_key() {
        let (store, _temp) = create_test_backend();
        store.set("floatChatActiveId", "chat_1").unwrap();
        store.remove("floatChatActiveId").unwrap();
        assert!(store.get("floatChatActiveId").unwrap().is_none());
    }

    #[test]
    fn remove_missing_key_succeeds() {
        let (store, _temp) = create_test_backend();
        store.remove("nonexistent").unwrap();
    }

    #[test]
    fn values_survive_a_new_backend() {
        let temp_dir = TempDir::new().unwrap();
        FileBackend::new(temp_dir.path().to_path_buf())
            .unwrap()
            .set("floatChatHistory", r#"{"a":1}"#)
            .unwrap();

        let reopened = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("floatChatHistory").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }
}
