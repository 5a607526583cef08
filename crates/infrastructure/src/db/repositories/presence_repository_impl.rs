//! 在线状态仓储实现
//!
//! (room_id, user_id) 唯一，last-writer-wins 刷新 last_seen。
//! "算在线"的窗口过滤在查询侧完成，清扫任务用独立的 TTL 物理删除。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use application::{PresenceRepository, RepoResult};
use domain::{OnlineMember, RoomId, Timestamp, UserId};

use super::map_sqlx;
use crate::db::DbPool;

#[derive(Debug, Clone, FromRow)]
struct DbOnlineMember {
    room_id: Uuid,
    user_id: Uuid,
    last_seen: DateTime<Utc>,
}

impl From<DbOnlineMember> for OnlineMember {
    fn from(row: DbOnlineMember) -> Self {
        OnlineMember::new(
            RoomId::new(row.room_id),
            UserId::new(row.user_id),
            row.last_seen,
        )
    }
}

pub struct PgPresenceRepository {
    pool: DbPool,
}

impl PgPresenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceRepository for PgPresenceRepository {
    async fn upsert(&self, member: OnlineMember) -> RepoResult<()> {
        query(
            r#"
            INSERT INTO online_members (room_id, user_id, last_seen)
            VALUES ($1, $2, $3)
            ON CONFLICT (room_id, user_id) DO UPDATE SET last_seen = EXCLUDED.last_seen
            "#,
        )
        .bind(Uuid::from(member.room_id))
        .bind(Uuid::from(member.user_id))
        .bind(member.last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn remove(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()> {
        query("DELETE FROM online_members WHERE room_id = $1 AND user_id = $2")
            .bind(Uuid::from(room_id))
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_seen_since(
        &self,
        room_id: RoomId,
        cutoff: Timestamp,
    ) -> RepoResult<Vec<OnlineMember>> {
        let rows = query_as::<_, DbOnlineMember>(
            r#"
            SELECT room_id, user_id, last_seen
            FROM online_members
            WHERE room_id = $1 AND last_seen >= $2
            ORDER BY last_seen DESC
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(OnlineMember::from).collect())
    }

    async fn delete_seen_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        let result = query("DELETE FROM online_members WHERE last_seen < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }
}
