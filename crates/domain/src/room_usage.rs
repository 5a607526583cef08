use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId};

/// 每用户每月的建房计数，用于配额控制
///
/// (user_id, year, month) 唯一，每月一行；历史行由周清扫任务在 3 个月后删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsage {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub rooms_created: u32,
}

impl RoomUsage {
    /// 时间戳所属的 (year, month) 计费键
    pub fn period_of(at: Timestamp) -> (i32, u32) {
        (at.year(), at.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn period_follows_calendar_month() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        assert_eq!(RoomUsage::period_of(at), (2026, 8));
    }
}
