use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomId, Timestamp, UserId};

/// 房间成员角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Member,
    Moderator,
}

/// 成员资格状态，只有 Approved 才授予房间访问权
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
    Banned,
    Removed,
}

/// 房间成员关系，(room_id, user_id) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

impl RoomMember {
    pub fn new(
        room_id: RoomId,
        user_id: UserId,
        role: MemberRole,
        status: MemberStatus,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            room_id,
            user_id,
            role,
            status,
            joined_at,
            removed_at: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.status, MemberStatus::Approved)
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self.role, MemberRole::Moderator)
    }

    pub fn approve(&mut self) {
        self.status = MemberStatus::Approved;
        self.removed_at = None;
    }

    pub fn reject(&mut self) {
        self.status = MemberStatus::Rejected;
    }

    pub fn ban(&mut self, at: Timestamp) {
        self.status = MemberStatus::Banned;
        self.removed_at = Some(at);
    }

    pub fn remove(&mut self, at: Timestamp) {
        self.status = MemberStatus::Removed;
        self.removed_at = Some(at);
    }
}
