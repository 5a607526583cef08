//! 建房用量仓储实现
//!
//! (user_id, year, month) 唯一，计数用 upsert 原子自增，
//! 并发建房不会少算配额。

use async_trait::async_trait;
use chrono::Datelike;
use sqlx::{query, query_scalar};
use uuid::Uuid;

use application::{RepoResult, RoomUsageRepository};
use domain::{Timestamp, UserId};

use super::map_sqlx;
use crate::db::DbPool;

pub struct PgRoomUsageRepository {
    pool: DbPool,
}

impl PgRoomUsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomUsageRepository for PgRoomUsageRepository {
    async fn rooms_created_in(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32> {
        let count: Option<i32> = query_scalar(
            r#"
            SELECT rooms_created
            FROM user_room_usage
            WHERE user_id = $1 AND year = $2 AND month = $3
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(year)
        .bind(month as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(count.unwrap_or(0) as u32)
    }

    async fn increment(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32> {
        let total: i32 = query_scalar(
            r#"
            INSERT INTO user_room_usage (user_id, year, month, rooms_created)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, year, month)
            DO UPDATE SET rooms_created = user_room_usage.rooms_created + 1
            RETURNING rooms_created
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(year)
        .bind(month as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(total as u32)
    }

    async fn delete_periods_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        let result = query("DELETE FROM user_room_usage WHERE (year, month) < ($1, $2)")
            .bind(cutoff.year())
            .bind(cutoff.month() as i32)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }
}
