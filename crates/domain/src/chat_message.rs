use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageBody, MessageId, RoomId, Timestamp, UserId};

/// 消息内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Voice,
    Video,
}

impl MessageKind {
    /// 只有文本消息可以被编辑，群聊与私信统一执行此规则。
    pub fn is_editable(&self) -> bool {
        matches!(self, MessageKind::Text)
    }
}

/// 群聊消息状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMessageStatus {
    Sent,
    Delivered,
    Read,
    Edited,
}

/// 房间群聊消息
///
/// 创建后正文可原地编辑（is_edited 标记），删除为物理删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub body: Option<MessageBody>,
    pub kind: MessageKind,
    pub file_url: Option<String>,
    pub status: ChatMessageStatus,
    pub is_edited: bool,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        sender_id: UserId,
        body: Option<MessageBody>,
        kind: MessageKind,
        file_url: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
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
            body,
            kind,
            file_url,
            status: ChatMessageStatus::Sent,
            is_edited: false,
            created_at,
            updated_at: None,
        })
    }

    /// 编辑消息正文。调用方必须先校验操作者是消息作者。
    pub fn edit(&mut self, new_body: MessageBody, at: Timestamp) -> Result<(), DomainError> {
        if !self.kind.is_editable() {
            return Err(DomainError::operation_not_allowed(
                "only text messages can be edited",
            ));
        }
        self.body = Some(new_body);
        self.is_edited = true;
        self.status = ChatMessageStatus::Edited;
        self.updated_at = Some(at);
        Ok(())
    }

    pub fn is_author(&self, user_id: UserId) -> bool {
        self.sender_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message() -> ChatMessage {
        ChatMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            Some(MessageBody::chat("hello").unwrap()),
            MessageKind::Text,
            None,
            chrono::Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn requires_body_or_file() {
        let result = ChatMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            None,
            MessageKind::Text,
            None,
            chrono::Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn edit_marks_message_edited() {
        let mut message = text_message();
        message
            .edit(MessageBody::chat("changed").unwrap(), chrono::Utc::now())
            .unwrap();

        assert!(message.is_edited);
        assert_eq!(message.status, ChatMessageStatus::Edited);
        assert_eq!(message.body.as_ref().unwrap().as_str(), "changed");
        assert!(message.updated_at.is_some());
    }

    #[test]
    fn non_text_messages_are_immutable() {
        let mut message = ChatMessage::new(
            MessageId::generate(),
            RoomId::generate(),
            UserId::generate(),
            None,
            MessageKind::Image,
            Some("/files/images/pic.png".to_owned()),
            chrono::Utc::now(),
        )
        .unwrap();

        let result = message.edit(MessageBody::chat("nope").unwrap(), chrono::Utc::now());
        assert!(matches!(
            result,
            Err(DomainError::OperationNotAllowed { .. })
        ));
    }
}
