use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::application::{AppError, AppResult, BlobStore};

pub struct SqliteBlobStore {
    pool: SqlitePool,
}

impl SqliteBlobStore {
    /// db_url 示例
    /// - "sqlite:/data/state.db" (推荐用于 docker volume)
    /// - "sqlite:./state.db"
    /// - "sqlite::memory:"
    pub async fn new(db_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .create_if_missing(true);

        // 单连接：watcher 不会并发写入，内存数据库也只在连接存活期间存在
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
              name TEXT PRIMARY KEY,
              body BLOB NOT NULL,
              updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT body FROM blobs WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(row.map(|r| r.0))
    }

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blobs(name, body, updated_at) VALUES(?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET body=excluded.body, updated_at=excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(data)
        .bind(now_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn put_new(&self, name: &str, data: &[u8]) -> AppResult<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO blobs(name, body, updated_at) VALUES(?, ?, ?)")
            .bind(name)
            .bind(data)
            .bind(now_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        // substr instead of LIKE: archive names contain `_`
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM blobs WHERE substr(name, 1, length(?1)) = ?1 ORDER BY name",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

fn now_string() -> String {
    chrono::Utc::now().to_rfc3339()
}
