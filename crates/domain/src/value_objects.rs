use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = chrono::DateTime<chrono::Utc>;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

uuid_id!(
    /// 用户唯一标识。
    UserId
);
uuid_id!(
    /// 房间唯一标识。
    RoomId
);
uuid_id!(
    /// 消息唯一标识（群聊与私信共用）。
    MessageId
);
uuid_id!(
    /// 帖子唯一标识。
    PostId
);
uuid_id!(
    /// 商品唯一标识（公共广播主题使用）。
    ProductId
);

/// 群聊消息正文的最大长度。
pub const CHAT_BODY_MAX_LEN: usize = 1000;
/// 私信正文的最大长度。
pub const DIRECT_BODY_MAX_LEN: usize = 2000;

/// 经过长度校验的消息正文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody(String);

impl MessageBody {
    /// 群聊消息正文（≤ 1000 字符）。
    pub fn chat(value: impl Into<String>) -> Result<Self, DomainError> {
        Self::parse(value, CHAT_BODY_MAX_LEN)
    }

    /// 私信正文（≤ 2000 字符）。
    pub fn direct(value: impl Into<String>) -> Result<Self, DomainError> {
        Self::parse(value, DIRECT_BODY_MAX_LEN)
    }

    fn parse(value: impl Into<String>, max_len: usize) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::invalid_argument("body", "cannot be empty"));
        }
        if value.chars().count() > max_len {
            return Err(DomainError::invalid_argument(
                "body",
                format!("exceeds maximum length of {max_len} characters"),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 私信会话的确定性分组键。
///
/// 由 (房间, 排序后的用户对) 推导，两个方向的消息、输入指示、已读回执
/// 必须计算出完全相同的键，客户端才能把它们关联到同一会话。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn derive(room_id: RoomId, a: UserId, b: UserId) -> Self {
        let (low, high) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        Self(format!("dm:{}:{}:{}", room_id, low, high))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经过外部服务生成的密码哈希。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let hash = value.into();
        if hash.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "password_hash",
                "cannot be empty",
            ));
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_symmetric() {
        let room = RoomId::generate();
        let a = UserId::generate();
        let b = UserId::generate();

        assert_eq!(
            ConversationId::derive(room, a, b),
            ConversationId::derive(room, b, a)
        );
    }

    #[test]
    fn conversation_id_differs_per_room() {
        let a = UserId::generate();
        let b = UserId::generate();

        assert_ne!(
            ConversationId::derive(RoomId::generate(), a, b),
            ConversationId::derive(RoomId::generate(), a, b)
        );
    }

    #[test]
    fn chat_body_rejects_empty_and_oversized() {
        assert!(MessageBody::chat("   ").is_err());
        assert!(MessageBody::chat("x".repeat(CHAT_BODY_MAX_LEN)).is_ok());
        assert!(MessageBody::chat("x".repeat(CHAT_BODY_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn direct_body_allows_longer_text() {
        assert!(MessageBody::direct("x".repeat(2000)).is_ok());
        assert!(MessageBody::direct("x".repeat(2001)).is_err());
    }
}
