use crate::application::{AppError, AppResult, BlobStore};
use crate::domain::{decode_change_set, encode_change_set, Change, EventRecord};

pub const SNAPSHOT_BLOB: &str = "last_data.json";
pub const HASH_BLOB: &str = "hash.txt";
pub const ARCHIVE_PREFIX: &str = "backup/";

const MAX_ARCHIVE_SUFFIX: u32 = 1000;

/// Watcher state kept in a [`BlobStore`]: the last snapshot, the hash of the
/// last payload, and one archive per detected change-set.
#[derive(Clone, Copy)]
pub struct StateStore<'a> {
    pub blobs: &'a dyn BlobStore,
}

impl<'a> StateStore<'a> {
    pub fn new(blobs: &'a dyn BlobStore) -> Self {
        Self { blobs }
    }

    pub async fn load_snapshot(&self) -> AppResult<Option<Vec<EventRecord>>> {
        let Some(raw) = self.blobs.get(SNAPSHOT_BLOB).await? else {
            return Ok(None);
        };
        let records = serde_json::from_slice(&raw)
            .map_err(|e| AppError::Storage(format!("stored snapshot is unreadable: {e}")))?;
        Ok(Some(records))
    }

    pub async fn save_snapshot(&self, records: &[EventRecord]) -> AppResult<()> {
        let raw = serde_json::to_vec(records).map_err(|e| AppError::Storage(e.to_string()))?;
        self.blobs.put(SNAPSHOT_BLOB, &raw).await
    }

    pub async fn load_hash(&self) -> AppResult<Option<String>> {
        let Some(raw) = self.blobs.get(HASH_BLOB).await? else {
            return Ok(None);
        };
        let hash = String::from_utf8_lossy(&raw).trim().to_string();
        Ok((!hash.is_empty()).then_some(hash))
    }

    pub async fn save_hash(&self, hash: &str) -> AppResult<()> {
        self.blobs.put(HASH_BLOB, hash.as_bytes()).await
    }

    /// Writes `backup/<stamp>.json`; never overwrites, a clash gets a
    /// `-1`, `-2`, ... suffix. Returns the blob name used.
    pub async fn archive_changes(&self, changes: &[Change], stamp: &str) -> AppResult<String> {
        let raw = encode_change_set(changes).map_err(|e| AppError::Storage(e.to_string()))?;

        let mut name = format!("{ARCHIVE_PREFIX}{stamp}.json");
        for n in 1..=MAX_ARCHIVE_SUFFIX {
            if self.blobs.put_new(&name, &raw).await? {
                return Ok(name);
            }
            name = format!("{ARCHIVE_PREFIX}{stamp}-{n}.json");
        }
        Err(AppError::Storage(format!(
            "no free archive name for stamp {stamp}"
        )))
    }

    pub async fn list_archives(&self) -> AppResult<Vec<String>> {
        self.blobs.list(ARCHIVE_PREFIX).await
    }

    /// Accepts a full blob name (`backup/240101_12:00.json`) or just the stamp.
    pub async fn load_archive(&self, name: &str) -> AppResult<Option<Vec<Change>>> {
        let name = archive_blob_name(name);
        let Some(raw) = self.blobs.get(&name).await? else {
            return Ok(None);
        };
        Ok(Some(decode_change_set(&raw)?))
    }
}

pub fn archive_blob_name(name: &str) -> String {
    let mut out = String::new();
    if !name.starts_with(ARCHIVE_PREFIX) {
        out.push_str(ARCHIVE_PREFIX);
    }
    out.push_str(name);
    if !name.ends_with(".json") {
        out.push_str(".json");
    }
    out
}
