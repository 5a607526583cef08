//! 本地文件系统对象存储
//!
//! 键就是相对路径，URL 由公开前缀 + 键拼接。路径遍历在上传服务的
//! 文件名清洗阶段拦截，这里只负责落盘。

use std::path::PathBuf;

use async_trait::async_trait;

use application::{BlobStorage, StorageError};

pub struct FsBlobStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl BlobStorage for FsBlobStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::io(err.to_string()))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|err| StorageError::io(err.to_string()))?;

        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            path
        ))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        tokio::fs::try_exists(self.full_path(path))
            .await
            .map_err(|err| StorageError::io(err.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.full_path(path)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(err.to_string())),
        }
    }
}
