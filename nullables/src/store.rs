//! Nullable state persistence: keeps the document in memory and counts
//! flushes.

use srand_store::{StatePersister, StoreError};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    contents: Option<String>,
    saves: usize,
    fail_saves: bool,
}

/// An in-memory [`StatePersister`] for testing.
///
/// Clones share the same document, so a test can hand one clone to the
/// state and inspect what was flushed through another.
#[derive(Clone, Default)]
pub struct NullStatePersister {
    inner: Arc<Mutex<Inner>>,
}

impl NullStatePersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `text` already "on disk".
    pub fn with_contents(text: impl Into<String>) -> Self {
        let persister = Self::new();
        persister.lock().contents = Some(text.into());
        persister
    }

    /// The last flushed document.
    pub fn contents(&self) -> Option<String> {
        self.lock().contents.clone()
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    /// Make every following save fail.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StatePersister for NullStatePersister {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock().contents.clone())
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_saves {
            return Err(StoreError::Backend("null persister set to fail".into()));
        }
        inner.contents = Some(contents.to_string());
        inner.saves += 1;
        Ok(())
    }
}
