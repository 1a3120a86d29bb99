//! Where the serialized state goes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::StoreError;

/// A backend holding the serialized shared random state.
///
/// Implementations replace the whole document on every save; there are no
/// partial writes.
pub trait StatePersister: Send {
    /// Read the stored document, `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored document.
    fn save(&self, contents: &str) -> Result<(), StoreError>;
}

/// Persists the state to a single file.
///
/// Saves write a sibling `.tmp` file, sync it, then rename it over the
/// target so a crash leaves either the old or the new document.
pub struct FileStatePersister {
    path: PathBuf,
}

impl FileStatePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StatePersister for FileStatePersister {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the serialized state in memory only (no state file).
#[derive(Default)]
pub struct MemoryPersister {
    contents: Mutex<Option<String>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved document.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl StatePersister for MemoryPersister {
    fn load(&self) -> Result<Option<String>, StoreError> {
        self.contents
            .lock()
            .map(|c| c.clone())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        let mut slot = self
            .contents
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let persister = FileStatePersister::new(dir.path().join("sr-state"));
        assert!(persister.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let persister = FileStatePersister::new(dir.path().join("nested").join("sr-state"));
        persister.save("Version 1\n").unwrap();
        assert_eq!(persister.load().unwrap().as_deref(), Some("Version 1\n"));
        persister.save("Version 2\n").unwrap();
        assert_eq!(persister.load().unwrap().as_deref(), Some("Version 2\n"));
        assert!(!persister.tmp_path().exists());
    }

    #[test]
    fn memory_persister_keeps_last_document() {
        let persister = MemoryPersister::new();
        assert!(persister.load().unwrap().is_none());
        persister.save("a").unwrap();
        persister.save("b").unwrap();
        assert_eq!(persister.contents().as_deref(), Some("b"));
    }
}
