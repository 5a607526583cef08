//! 房间仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use application::{RepoResult, RepositoryError, RoomRepository};
use domain::{PasswordHash, Room, RoomId, RoomKind, RoomMember, UserId};

use super::room_member_repository_impl::{member_role_to_str, member_status_to_str};
use super::{map_sqlx, unknown_value};
use crate::db::DbPool;

pub(crate) fn room_kind_to_str(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Public => "public",
        RoomKind::Private => "private",
        RoomKind::Secure => "secure",
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbRoom {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    kind: String,
    password_hash: Option<String>,
    is_commercial: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbRoom> for Room {
    type Error = RepositoryError;

    fn try_from(row: DbRoom) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "public" => RoomKind::Public,
            "private" => RoomKind::Private,
            "secure" => RoomKind::Secure,
            other => return Err(unknown_value("room kind", other)),
        };
        let password = row
            .password_hash
            .map(PasswordHash::new)
            .transpose()
            .map_err(|err| RepositoryError::storage(err.to_string()))?;

        Ok(Room {
            id: RoomId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            name: row.name,
            kind,
            password,
            is_commercial: row.is_commercial,
            created_at: row.created_at,
        })
    }
}

pub struct PgRoomRepository {
    pool: DbPool,
}

impl PgRoomRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_ROOM: &str = r#"
    SELECT id, owner_id, name, kind, password_hash, is_commercial, created_at
    FROM rooms
"#;

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn create_with_owner(&self, room: Room, owner: RoomMember) -> RepoResult<Room> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        query(
            r#"
            INSERT INTO rooms (id, owner_id, name, kind, password_hash, is_commercial, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::from(room.id))
        .bind(Uuid::from(room.owner_id))
        .bind(&room.name)
        .bind(room_kind_to_str(room.kind))
        .bind(room.password.as_ref().map(|hash| hash.as_str()))
        .bind(room.is_commercial)
        .bind(room.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        query(
            r#"
            INSERT INTO room_members (room_id, user_id, role, status, joined_at, removed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::from(owner.room_id))
        .bind(Uuid::from(owner.user_id))
        .bind(member_role_to_str(owner.role))
        .bind(member_status_to_str(owner.status))
        .bind(owner.joined_at)
        .bind(owner.removed_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        let row = query_as::<_, DbRoom>(&format!("{SELECT_ROOM} WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Room::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Room>> {
        let row = query_as::<_, DbRoom>(&format!("{SELECT_ROOM} WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Room::try_from).transpose()
    }

    async fn delete(&self, id: RoomId) -> RepoResult<()> {
        // 成员、消息、私信与在线状态由外键 ON DELETE CASCADE 带走
        query("DELETE FROM rooms WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}
