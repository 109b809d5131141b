use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::application::{AppError, AppResult, FeedSource};
use crate::domain::EventRecord;

/// Serves a payload set by the caller; used for tests and dry runs.
#[derive(Clone, Default)]
pub struct FakeFeedSource {
    payload: Arc<Mutex<Vec<u8>>>,
}

impl FakeFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_payload(&self, payload: impl Into<Vec<u8>>) {
        if let Ok(mut p) = self.payload.lock() {
            *p = payload.into();
        }
    }

    /// Wraps `records` in the feed envelope (`{"index": [...]}`).
    pub fn set_records(&self, records: &[EventRecord]) {
        let envelope = json!({ "index": records });
        self.set_payload(envelope.to_string());
    }
}

#[async_trait]
impl FeedSource for FakeFeedSource {
    async fn fetch(&self) -> AppResult<Vec<u8>> {
        self.payload
            .lock()
            .map(|p| p.clone())
            .map_err(|_| AppError::Provider("lock poisoned".into()))
    }
}
