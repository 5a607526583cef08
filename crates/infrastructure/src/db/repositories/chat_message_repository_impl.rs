//! 群聊消息仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use application::{ChatMessageRepository, RepoResult, RepositoryError};
use domain::{ChatMessage, ChatMessageStatus, MessageBody, MessageId, MessageKind, RoomId, UserId};

use super::{map_sqlx, unknown_value};
use crate::db::DbPool;

pub(crate) fn message_kind_to_str(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Text => "text",
        MessageKind::Image => "image",
        MessageKind::File => "file",
        MessageKind::Voice => "voice",
        MessageKind::Video => "video",
    }
}

pub(crate) fn message_kind_from_str(kind: &str) -> Result<MessageKind, RepositoryError> {
    match kind {
        "text" => Ok(MessageKind::Text),
        "image" => Ok(MessageKind::Image),
        "file" => Ok(MessageKind::File),
        "voice" => Ok(MessageKind::Voice),
        "video" => Ok(MessageKind::Video),
        other => Err(unknown_value("message kind", other)),
    }
}

fn status_to_str(status: ChatMessageStatus) -> &'static str {
    match status {
        ChatMessageStatus::Sent => "sent",
        ChatMessageStatus::Delivered => "delivered",
        ChatMessageStatus::Read => "read",
        ChatMessageStatus::Edited => "edited",
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbChatMessage {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    body: Option<String>,
    kind: String,
    file_url: Option<String>,
    status: String,
    is_edited: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbChatMessage> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: DbChatMessage) -> Result<Self, Self::Error> {
        let kind = message_kind_from_str(&row.kind)?;
        let status = match row.status.as_str() {
            "sent" => ChatMessageStatus::Sent,
            "delivered" => ChatMessageStatus::Delivered,
            "read" => ChatMessageStatus::Read,
            "edited" => ChatMessageStatus::Edited,
            other => return Err(unknown_value("message status", other)),
        };
        let body = row
            .body
            .map(MessageBody::chat)
            .transpose()
            .map_err(|err| RepositoryError::storage(err.to_string()))?;

        Ok(ChatMessage {
            id: MessageId::new(row.id),
            room_id: RoomId::new(row.room_id),
            sender_id: UserId::new(row.sender_id),
            body,
            kind,
            file_url: row.file_url,
            status,
            is_edited: row.is_edited,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgChatMessageRepository {
    pool: DbPool,
}

impl PgChatMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    async fn create(&self, message: &ChatMessage) -> RepoResult<()> {
        query(
            r#"
            INSERT INTO chat_messages
                (id, room_id, sender_id, body, kind, file_url, status, is_edited, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.room_id))
        .bind(Uuid::from(message.sender_id))
        .bind(message.body.as_ref().map(|body| body.as_str()))
        .bind(message_kind_to_str(message.kind))
        .bind(message.file_url.as_deref())
        .bind(status_to_str(message.status))
        .bind(message.is_edited)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<ChatMessage>> {
        let row = query_as::<_, DbChatMessage>(
            r#"
            SELECT id, room_id, sender_id, body, kind, file_url, status, is_edited, created_at, updated_at
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(ChatMessage::try_from).transpose()
    }

    async fn update(&self, message: &ChatMessage) -> RepoResult<()> {
        query(
            r#"
            UPDATE chat_messages
            SET body = $2, status = $3, is_edited = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.body.as_ref().map(|body| body.as_str()))
        .bind(status_to_str(message.status))
        .bind(message.is_edited)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> RepoResult<()> {
        query("DELETE FROM chat_messages WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_page(
        &self,
        room_id: RoomId,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<ChatMessage>> {
        let rows = query_as::<_, DbChatMessage>(
            r#"
            SELECT id, room_id, sender_id, body, kind, file_url, status, is_edited, created_at, updated_at
            FROM chat_messages
            WHERE room_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(ChatMessage::try_from).collect()
    }
}
