//! 房间成员仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use application::{RepoResult, RepositoryError, RoomMemberRepository};
use domain::{MemberRole, MemberStatus, RoomId, RoomMember, UserId};

use super::{map_sqlx, unknown_value};
use crate::db::DbPool;

pub(crate) fn member_role_to_str(role: MemberRole) -> &'static str {
    match role {
        MemberRole::Member => "member",
        MemberRole::Moderator => "moderator",
    }
}

pub(crate) fn member_status_to_str(status: MemberStatus) -> &'static str {
    match status {
        MemberStatus::Pending => "pending",
        MemberStatus::Approved => "approved",
        MemberStatus::Rejected => "rejected",
        MemberStatus::Banned => "banned",
        MemberStatus::Removed => "removed",
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbRoomMember {
    room_id: Uuid,
    user_id: Uuid,
    role: String,
    status: String,
    joined_at: DateTime<Utc>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbRoomMember> for RoomMember {
    type Error = RepositoryError;

    fn try_from(row: DbRoomMember) -> Result<Self, Self::Error> {
        let role = match row.role.as_str() {
            "member" => MemberRole::Member,
            "moderator" => MemberRole::Moderator,
            other => return Err(unknown_value("member role", other)),
        };
        let status = match row.status.as_str() {
            "pending" => MemberStatus::Pending,
            "approved" => MemberStatus::Approved,
            "rejected" => MemberStatus::Rejected,
            "banned" => MemberStatus::Banned,
            "removed" => MemberStatus::Removed,
            other => return Err(unknown_value("member status", other)),
        };

        Ok(RoomMember {
            room_id: RoomId::new(row.room_id),
            user_id: UserId::new(row.user_id),
            role,
            status,
            joined_at: row.joined_at,
            removed_at: row.removed_at,
        })
    }
}

pub struct PgRoomMemberRepository {
    pool: DbPool,
}

impl PgRoomMemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomMemberRepository for PgRoomMemberRepository {
    async fn find(&self, room_id: RoomId, user_id: UserId) -> RepoResult<Option<RoomMember>> {
        let row = query_as::<_, DbRoomMember>(
            r#"
            SELECT room_id, user_id, role, status, joined_at, removed_at
            FROM room_members
            WHERE room_id = $1 AND user_id = $2
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(Uuid::from(user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(RoomMember::try_from).transpose()
    }

    async fn upsert(&self, member: RoomMember) -> RepoResult<()> {
        query(
            r#"
            INSERT INTO room_members (room_id, user_id, role, status, joined_at, removed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (room_id, user_id) DO UPDATE
            SET role = EXCLUDED.role,
                status = EXCLUDED.status,
                joined_at = EXCLUDED.joined_at,
                removed_at = EXCLUDED.removed_at
            "#,
        )
        .bind(Uuid::from(member.room_id))
        .bind(Uuid::from(member.user_id))
        .bind(member_role_to_str(member.role))
        .bind(member_status_to_str(member.status))
        .bind(member.joined_at)
        .bind(member.removed_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_for_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>> {
        let rows = query_as::<_, DbRoomMember>(
            r#"
            SELECT room_id, user_id, role, status, joined_at, removed_at
            FROM room_members
            WHERE room_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(Uuid::from(room_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(RoomMember::try_from).collect()
    }
}
