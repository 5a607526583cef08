//! 领域模型错误定义
//!
//! 定义了系统中所有可能的业务错误类型，提供清晰的错误上下文。
//! HTTP 层的映射：授权类 → 403，校验类 → 422，缺失类 → 404。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("invalid argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 用户不是房间的已批准成员
    #[error("user is not an approved participant of the room")]
    NotRoomParticipant,

    /// 操作者不是消息作者
    #[error("user is not the author of the message")]
    NotMessageAuthor,

    /// 权限不足（版主/房主操作）
    #[error("insufficient permissions")]
    InsufficientPermissions,

    /// 房间不存在
    #[error("room not found")]
    RoomNotFound,

    /// 消息不存在
    #[error("message not found")]
    MessageNotFound,

    /// 帖子不存在
    #[error("post not found")]
    PostNotFound,

    /// 成员关系不存在
    #[error("room member not found")]
    MemberNotFound,

    /// 房间名已被占用
    #[error("room name already taken")]
    RoomNameTaken,

    /// 私有房间需要正确的密码
    #[error("room requires a valid password")]
    RoomPasswordRequired,

    /// 当月建房配额已用完
    #[error("monthly room creation quota exceeded")]
    RoomQuotaExceeded,

    /// 操作不被允许（如编辑非文本消息、给自己发私信）
    #[error("operation not allowed: {reason}")]
    OperationNotAllowed { reason: String },
}

impl DomainError {
    /// 创建参数校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 创建操作不允许错误
    pub fn operation_not_allowed(reason: impl Into<String>) -> Self {
        Self::OperationNotAllowed {
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
