//! 房间在线状态记录
//!
//! 在线状态是"软"的：过期是计算属性（now − last_seen 超过窗口），而不是
//! 存储的字段。行本身可能在逻辑下线后继续存在，直到周期清扫物理删除。
//! "算在线"的窗口（5 分钟）与清扫 TTL（8 分钟）是两个独立参数，见 config。

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::value_objects::{RoomId, Timestamp, UserId};

/// 房间在线成员行，(room_id, user_id) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineMember {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub last_seen: Timestamp,
}

impl OnlineMember {
    pub fn new(room_id: RoomId, user_id: UserId, last_seen: Timestamp) -> Self {
        Self {
            room_id,
            user_id,
            last_seen,
        }
    }

    /// last_seen 在窗口内则算在线
    pub fn is_online(&self, now: Timestamp, window: Duration) -> bool {
        now - self.last_seen <= window
    }

    /// 心跳/上线把 last_seen 刷新到 now（last-writer-wins）
    pub fn refresh(&mut self, now: Timestamp) {
        self.last_seen = now;
    }
}
