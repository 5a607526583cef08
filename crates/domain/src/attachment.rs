//! 消息附件校验
//!
//! 文件类校验同时检查声明的类型标签和服务端核对的 MIME 类型，
//! 每种类型有独立的 MIME 白名单和大小上限；标签与 MIME 不匹配直接拒绝。

use serde::{Deserialize, Serialize};

use crate::chat_message::MessageKind;
use crate::errors::DomainError;

const MB: u64 = 1024 * 1024;

/// 附件类别标签（客户端声明，服务端核对）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
    Voice,
    Video,
}

impl AttachmentKind {
    /// 每种类别允许的 MIME 类型
    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            AttachmentKind::Image => &["image/jpeg", "image/png", "image/gif", "image/webp"],
            AttachmentKind::Document => &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "text/plain",
                "application/zip",
            ],
            AttachmentKind::Voice => &["audio/mpeg", "audio/ogg", "audio/wav", "audio/webm"],
            AttachmentKind::Video => &["video/mp4", "video/webm", "video/quicktime"],
        }
    }

    /// 大小上限：图片/语音 ≤ 10MB，文档/视频 ≤ 50MB
    pub fn max_size_bytes(&self) -> u64 {
        match self {
            AttachmentKind::Image | AttachmentKind::Voice => 10 * MB,
            AttachmentKind::Document | AttachmentKind::Video => 50 * MB,
        }
    }

    /// 附件类别对应的消息类型
    pub fn message_kind(&self) -> MessageKind {
        match self {
            AttachmentKind::Image => MessageKind::Image,
            AttachmentKind::Document => MessageKind::File,
            AttachmentKind::Voice => MessageKind::Voice,
            AttachmentKind::Video => MessageKind::Video,
        }
    }

    /// 存储目录类别名
    pub fn category(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "images",
            AttachmentKind::Document => "documents",
            AttachmentKind::Voice => "voice",
            AttachmentKind::Video => "videos",
        }
    }
}

/// 校验声明类别、服务端 MIME 和大小的组合
pub fn validate_attachment(
    kind: AttachmentKind,
    mime_type: &str,
    size_bytes: u64,
) -> Result<(), DomainError> {
    if !kind.allowed_mime_types().contains(&mime_type) {
        return Err(DomainError::invalid_argument(
            "mime_type",
            format!("{mime_type} is not allowed for {kind:?} attachments"),
        ));
    }
    let max = kind.max_size_bytes();
    if size_bytes > max {
        return Err(DomainError::invalid_argument(
            "size",
            format!("file exceeds the {}MB limit", max / MB),
        ));
    }
    if size_bytes == 0 {
        return Err(DomainError::invalid_argument("size", "file is empty"));
    }
    Ok(())
}
