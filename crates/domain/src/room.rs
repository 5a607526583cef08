use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{PasswordHash, RoomId, Timestamp, UserId};

/// 房间可见性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// 公开房间，任何人可直接加入
    Public,
    /// 私有房间，加入需要密码
    Private,
    /// 安全房间，加入需要版主批准
    Secure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub owner_id: UserId,
    pub name: String,
    pub kind: RoomKind,
    #[serde(skip_serializing, default)] // 密码哈希不暴露给客户端
    pub password: Option<PasswordHash>,
    pub is_commercial: bool,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(
        id: RoomId,
        owner_id: UserId,
        name: impl Into<String>,
        kind: RoomKind,
        password: Option<PasswordHash>,
        is_commercial: bool,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        if name.chars().count() > 100 {
            return Err(DomainError::invalid_argument("name", "too long"));
        }
        if matches!(kind, RoomKind::Private) && password.is_none() {
            return Err(DomainError::RoomPasswordRequired);
        }

        Ok(Self {
            id,
            owner_id,
            name,
            kind,
            password,
            is_commercial,
            created_at,
        })
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}
