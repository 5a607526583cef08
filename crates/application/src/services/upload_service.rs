//! 附件上传服务
//!
//! 校验声明类别 + 服务端核对的 MIME + 大小，再写入对象存储。
//! 存储路径按 类别/年/月 编码，文件名前缀随机避免覆盖。

use std::sync::Arc;

use chrono::Datelike;
use data_encoding::BASE64;
use uuid::Uuid;

use domain::{validate_attachment, AttachmentKind, DomainError, MessageKind};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::storage::BlobStorage;

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// 上传结果：URL 用作后续消息的 file_url
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub url: String,
    pub path: String,
    pub kind: AttachmentKind,
    pub message_kind: MessageKind,
    pub size_bytes: u64,
}

pub struct UploadServiceDependencies {
    pub storage: Arc<dyn BlobStorage>,
    pub clock: Arc<dyn Clock>,
}

pub struct UploadService {
    deps: UploadServiceDependencies,
}

impl UploadService {
    pub fn new(deps: UploadServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<StoredUpload, ApplicationError> {
        let bytes = BASE64
            .decode(request.data_base64.as_bytes())
            .map_err(|_| DomainError::invalid_argument("data", "invalid base64 payload"))?;

        validate_attachment(request.kind, &request.mime_type, bytes.len() as u64)?;

        let file_name = sanitize_file_name(&request.file_name)?;
        let now = self.deps.clock.now();
        let path = format!(
            "{}/{}/{:02}/{}_{}",
            request.kind.category(),
            now.year(),
            now.month(),
            Uuid::new_v4(),
            file_name
        );

        let url = self.deps.storage.put(&path, &bytes).await?;

        tracing::info!(
            path = %path,
            size_bytes = bytes.len(),
            kind = ?request.kind,
            "附件已存储"
        );

        Ok(StoredUpload {
            url,
            path,
            kind: request.kind,
            message_kind: request.kind.message_kind(),
            size_bytes: bytes.len() as u64,
        })
    }
}

/// 去掉路径成分，拒绝空文件名
fn sanitize_file_name(raw: &str) -> Result<String, DomainError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_owned();
    if name.is_empty() || name == "." || name == ".." {
        return Err(DomainError::invalid_argument("file_name", "invalid file name"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("c:\\temp\\a.png").unwrap(), "a.png");
        assert!(sanitize_file_name("   ").is_err());
        assert!(sanitize_file_name("a/b/..").is_err());
    }
}
