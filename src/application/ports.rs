use async_trait::async_trait;

use crate::domain::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid feed: {0}")]
    InvalidFeed(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("notifier error: {0}")]
    Notifier(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Fetch the raw feed payload.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> AppResult<Vec<u8>>;
}

/// Flat key-value blob storage.
///
/// `get` answers `Ok(None)` for a missing blob; `Err` is reserved for real
/// failures so a first run can be told apart from an outage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>>;

    /// Create or overwrite.
    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()>;

    /// Create only. Returns false if `name` already exists.
    async fn put_new(&self, name: &str, data: &[u8]) -> AppResult<bool>;

    /// Names starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;
}

/// Deliver a single message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &Notification) -> AppResult<()>;
}
