use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::{AppError, AppResult, BlobStore};

#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(name).cloned())
    }

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()> {
        self.lock()?.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn put_new(&self, name: &str, data: &[u8]) -> AppResult<bool> {
        let mut inner = self.lock()?;
        if inner.contains_key(name) {
            return Ok(false);
        }
        inner.insert(name.to_string(), data.to_vec());
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
