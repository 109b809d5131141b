use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::application::{AppError, AppResult, BlobStore};

/// Blobs as files below a root directory; `/` in a name maps to a
/// sub-directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> AppResult<PathBuf> {
        let rel = Path::new(name);
        let valid = !name.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(AppError::Storage(format!("invalid blob name {name:?}")));
        }
        Ok(self.root.join(rel))
    }
}

async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {e}", parent.display())))?;
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("read {}: {e}", path.display()))),
        }
    }

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_for(name)?;
        ensure_parent(&path).await?;

        // write aside, then rename over the target
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Storage(format!("rename to {}: {e}", path.display())))?;
        tracing::debug!(blob = name, bytes = data.len(), "blob written");
        Ok(())
    }

    async fn put_new(&self, name: &str, data: &[u8]) -> AppResult<bool> {
        let path = self.path_for(name)?;
        ensure_parent(&path).await?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(AppError::Storage(format!("create {}: {e}", path.display())));
            }
        };
        file.write_all(data)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("flush {}: {e}", path.display())))?;
        Ok(true)
    }

    /// Looks only at the directory the prefix points into, not below it.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let (dir, _) = prefix.rsplit_once('/').unwrap_or(("", prefix));
        let dir_path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir)?
        };

        let mut entries = match tokio::fs::read_dir(&dir_path).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(AppError::Storage(format!("list {}: {e}", dir_path.display())));
            }
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_file || file_name.ends_with(".tmp") {
                continue;
            }
            let name = if dir.is_empty() {
                file_name
            } else {
                format!("{dir}/{file_name}")
            };
            if name.starts_with(prefix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
