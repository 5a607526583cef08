use serde::{Deserialize, Serialize};

use crate::chat_message::MessageKind;
use crate::errors::DomainError;
use crate::value_objects::{ConversationId, MessageBody, MessageId, RoomId, Timestamp, UserId};

/// 房间内点对点私信
///
/// 发送者与接收者必须都是同一房间的已批准成员，且不能给自己发私信。
/// 删除为软删除（is_deleted / deleted_at），已删除的消息不出现在会话列表中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: Option<MessageBody>,
    pub kind: MessageKind,
    pub file_url: Option<String>,
    pub read_at: Option<Timestamp>,
    pub edited_at: Option<Timestamp>,
    pub is_deleted: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl DirectMessage {
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        sender_id: UserId,
        receiver_id: UserId,
        body: Option<MessageBody>,
        kind: MessageKind,
        file_url: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if sender_id == receiver_id {
            return Err(DomainError::operation_not_allowed(
                "cannot send a direct message to yourself",
            ));
        }
        if body.is_none() && file_url.is_none() {
            return Err(DomainError::invalid_argument(
                "body",
                "message requires a body or a file payload",
            ));
        }

        Ok(Self {
            id,
            room_id,
            sender_id,
            receiver_id,
            body,
            kind,
            file_url,
            read_at: None,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at,
        })
    }

    /// 会话键对两个方向的消息保持一致。
    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::derive(self.room_id, self.sender_id, self.receiver_id)
    }

    pub fn edit(&mut self, new_body: MessageBody, at: Timestamp) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::operation_not_allowed(
                "cannot edit a deleted message",
            ));
        }
        if !self.kind.is_editable() {
            return Err(DomainError::operation_not_allowed(
                "only text messages can be edited",
            ));
        }
        self.body = Some(new_body);
        self.edited_at = Some(at);
        Ok(())
    }

    pub fn mark_deleted(&mut self, at: Timestamp) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn mark_read(&mut self, at: Timestamp) {
        if self.read_at.is_none() {
            self.read_at = Some(at);
        }
    }

    pub fn is_author(&self, user_id: UserId) -> bool {
        self.sender_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: MessageKind, file_url: Option<String>) -> DirectMessage {
        DirectMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            UserId::generate(),
            matches!(kind, MessageKind::Text).then(|| MessageBody::direct("hi").unwrap()),
            kind,
            file_url,
            chrono::Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_self_messaging() {
        let user = UserId::generate();
        let result = DirectMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            user,
            user,
            Some(MessageBody::direct("hi").unwrap()),
            MessageKind::Text,
            None,
            chrono::Utc::now(),
        );
        assert!(matches!(
            result,
            Err(DomainError::OperationNotAllowed { .. })
        ));
    }

    #[test]
    fn conversation_id_matches_both_directions() {
        let m = message(MessageKind::Text, None);
        assert_eq!(
            m.conversation_id(),
            ConversationId::derive(m.room_id, m.receiver_id, m.sender_id)
        );
    }

    #[test]
    fn image_direct_message_cannot_be_edited() {
        let mut m = message(MessageKind::Image, Some("/files/images/a.png".to_owned()));
        let result = m.edit(MessageBody::direct("nope").unwrap(), chrono::Utc::now());
        assert!(matches!(
            result,
            Err(DomainError::OperationNotAllowed { .. })
        ));
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut m = message(MessageKind::Text, None);
        let first = chrono::Utc::now();
        m.mark_read(first);
        m.mark_read(first + chrono::Duration::seconds(30));
        assert_eq!(m.read_at, Some(first));
    }
}
