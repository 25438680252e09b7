//! Local filesystem content store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::storage::ContentStore;

/// Writes menu sources into a directory, one file per key.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    root_dir: PathBuf,
}

impl LocalContentStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let path = self.path(key);
        self.write_bytes(&path, bytes).await?;

        log::debug!(
            "Stored {} bytes ({}) at {}",
            bytes.len(),
            content_type,
            path.display()
        );
        Ok(path.to_string_lossy().into_owned())
    }
}
