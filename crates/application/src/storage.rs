use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage error: {message}")]
    Io { message: String },
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// 按键寻址的对象存储契约（聊天附件、头像、商品图）
///
/// 核心不解释文件字节，MIME/大小校验在上传服务完成。
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// 写入并返回可供客户端访问的 URL
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError>;
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}
