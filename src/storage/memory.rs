use anyhow::Result;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Location, ObjectStore};

/// Keeps written objects in memory, keyed by their location URI.
///
/// A store built with [`MemoryStore::failing`] rejects every write with the
/// given cause and records nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    fail_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(cause: impl Into<String>) -> Self {
        Self {
            objects: Mutex::default(),
            fail_with: Some(cause.into()),
        }
    }

    pub fn get(&self, uri: &str) -> Option<Bytes> {
        self.objects.lock().ok()?.get(uri).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, location: &Location, body: Bytes) -> Result<()> {
        if let Some(cause) = &self.fail_with {
            anyhow::bail!("{cause}");
        }
        self.objects
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?
            .insert(location.to_string(), body);
        Ok(())
    }
}
