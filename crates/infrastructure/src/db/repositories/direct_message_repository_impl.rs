//! 私信仓储实现
//!
//! 删除为软删除（is_deleted / deleted_at），行保留用于审计；
//! 会话列表与批量已读都排除已删除的行。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, FromRow};
use uuid::Uuid;

use application::{DirectMessageRepository, RepoResult, RepositoryError};
use domain::{DirectMessage, MessageBody, MessageId, RoomId, Timestamp, UserId};

use super::chat_message_repository_impl::{message_kind_from_str, message_kind_to_str};
use super::map_sqlx;
use crate::db::DbPool;

#[derive(Debug, Clone, FromRow)]
struct DbDirectMessage {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    body: Option<String>,
    kind: String,
    file_url: Option<String>,
    read_at: Option<DateTime<Utc>>,
    edited_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbDirectMessage> for DirectMessage {
    type Error = RepositoryError;

    fn try_from(row: DbDirectMessage) -> Result<Self, Self::Error> {
        let kind = message_kind_from_str(&row.kind)?;
        let body = row
            .body
            .map(MessageBody::direct)
            .transpose()
            .map_err(|err| RepositoryError::storage(err.to_string()))?;

        Ok(DirectMessage {
            id: MessageId::new(row.id),
            room_id: RoomId::new(row.room_id),
            sender_id: UserId::new(row.sender_id),
            receiver_id: UserId::new(row.receiver_id),
            body,
            kind,
            file_url: row.file_url,
            read_at: row.read_at,
            edited_at: row.edited_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}

pub struct PgDirectMessageRepository {
    pool: DbPool,
}

impl PgDirectMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_DIRECT_MESSAGE: &str = r#"
    SELECT id, room_id, sender_id, receiver_id, body, kind, file_url,
           read_at, edited_at, is_deleted, deleted_at, created_at
    FROM direct_messages
"#;

#[async_trait]
impl DirectMessageRepository for PgDirectMessageRepository {
    async fn create(&self, message: &DirectMessage) -> RepoResult<()> {
        query(
            r#"
            INSERT INTO direct_messages
                (id, room_id, sender_id, receiver_id, body, kind, file_url,
                 read_at, edited_at, is_deleted, deleted_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.room_id))
        .bind(Uuid::from(message.sender_id))
        .bind(Uuid::from(message.receiver_id))
        .bind(message.body.as_ref().map(|body| body.as_str()))
        .bind(message_kind_to_str(message.kind))
        .bind(message.file_url.as_deref())
        .bind(message.read_at)
        .bind(message.edited_at)
        .bind(message.is_deleted)
        .bind(message.deleted_at)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<DirectMessage>> {
        let row = query_as::<_, DbDirectMessage>(&format!("{SELECT_DIRECT_MESSAGE} WHERE id = $1"))
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(DirectMessage::try_from).transpose()
    }

    async fn update(&self, message: &DirectMessage) -> RepoResult<()> {
        query(
            r#"
            UPDATE direct_messages
            SET body = $2, read_at = $3, edited_at = $4, is_deleted = $5, deleted_at = $6
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.body.as_ref().map(|body| body.as_str()))
        .bind(message.read_at)
        .bind(message.edited_at)
        .bind(message.is_deleted)
        .bind(message.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_conversation(
        &self,
        room_id: RoomId,
        user_a: UserId,
        user_b: UserId,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<DirectMessage>> {
        let rows = query_as::<_, DbDirectMessage>(&format!(
            r#"
            {SELECT_DIRECT_MESSAGE}
            WHERE room_id = $1
              AND NOT is_deleted
              AND ((sender_id = $2 AND receiver_id = $3)
                OR (sender_id = $3 AND receiver_id = $2))
            ORDER BY created_at DESC, id DESC
            OFFSET $4 LIMIT $5
            "#
        ))
        .bind(Uuid::from(room_id))
        .bind(Uuid::from(user_a))
        .bind(Uuid::from(user_b))
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(DirectMessage::try_from).collect()
    }

    async fn mark_read(
        &self,
        room_id: RoomId,
        receiver_id: UserId,
        sender_id: UserId,
        at: Timestamp,
    ) -> RepoResult<Vec<MessageId>> {
        let ids: Vec<Uuid> = query_scalar(
            r#"
            UPDATE direct_messages
            SET read_at = $4
            WHERE room_id = $1
              AND receiver_id = $2
              AND sender_id = $3
              AND read_at IS NULL
              AND NOT is_deleted
            RETURNING id
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(Uuid::from(receiver_id))
        .bind(Uuid::from(sender_id))
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(ids.into_iter().map(MessageId::new).collect())
    }
}
