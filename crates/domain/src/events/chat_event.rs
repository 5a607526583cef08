//! 类型化广播事件
//!
//! 每个事件有稳定的事件名和固定的 JSON 载荷结构（嵌套 user/message/product
//! 子对象 + ISO-8601 timestamp），序列化契约由类型而不是临时拼装保证，
//! 避免生产者与消费者之间的载荷漂移。线格式需保持与既有客户端位精确兼容。

use serde::{Deserialize, Serialize};

use crate::chat_message::ChatMessage;
use crate::direct_message::DirectMessage;
use crate::value_objects::{ConversationId, MessageId, ProductId, RoomId, Timestamp, UserId};

/// 事件载荷中的用户子对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        Self { id }
    }
}

/// 商品库存子对象
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    pub id: ProductId,
    pub in_stock: i64,
}

/// 商品评分子对象
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    pub id: ProductId,
    pub average_rating: f64,
    pub rating_count: i64,
}

/// 所有广播事件变体
///
/// `event` 字段承载稳定事件名；删除事件只携带标识符，从不携带正文。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ChatEvent {
    #[serde(rename = "message.sent")]
    MessageSent { user: UserRef, message: ChatMessage },

    #[serde(rename = "message.edited")]
    MessageEdited { user: UserRef, message: ChatMessage },

    #[serde(rename = "message.deleted")]
    MessageDeleted {
        message_id: MessageId,
        room_id: RoomId,
        user: UserRef,
    },

    #[serde(rename = "direct.message.sent")]
    DirectMessageSent {
        conversation_id: ConversationId,
        user: UserRef,
        message: DirectMessage,
    },

    #[serde(rename = "direct.message.edited")]
    DirectMessageEdited {
        conversation_id: ConversationId,
        user: UserRef,
        message: DirectMessage,
    },

    #[serde(rename = "direct.message.deleted")]
    DirectMessageDeleted {
        conversation_id: ConversationId,
        message_id: MessageId,
        room_id: RoomId,
        user: UserRef,
    },

    #[serde(rename = "direct.message.read")]
    DirectMessageRead {
        conversation_id: ConversationId,
        room_id: RoomId,
        reader: UserRef,
        sender: UserRef,
        message_ids: Vec<MessageId>,
    },

    #[serde(rename = "direct.message.typing")]
    DirectMessageTyping {
        conversation_id: ConversationId,
        room_id: RoomId,
        user: UserRef,
        is_typing: bool,
    },

    #[serde(rename = "user.online.status")]
    UserOnlineStatus {
        room_id: RoomId,
        user: UserRef,
        is_online: bool,
        online_user_ids: Vec<UserId>,
    },

    #[serde(rename = "product.stock.updated")]
    ProductStockUpdated { product: ProductStock },

    #[serde(rename = "product.rating.updated")]
    ProductRatingUpdated { product: ProductRating },
}

impl ChatEvent {
    /// 稳定事件名，与序列化出的 `event` 字段一致
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessageSent { .. } => "message.sent",
            ChatEvent::MessageEdited { .. } => "message.edited",
            ChatEvent::MessageDeleted { .. } => "message.deleted",
            ChatEvent::DirectMessageSent { .. } => "direct.message.sent",
            ChatEvent::DirectMessageEdited { .. } => "direct.message.edited",
            ChatEvent::DirectMessageDeleted { .. } => "direct.message.deleted",
            ChatEvent::DirectMessageRead { .. } => "direct.message.read",
            ChatEvent::DirectMessageTyping { .. } => "direct.message.typing",
            ChatEvent::UserOnlineStatus { .. } => "user.online.status",
            ChatEvent::ProductStockUpdated { .. } => "product.stock.updated",
            ChatEvent::ProductRatingUpdated { .. } => "product.rating.updated",
        }
    }
}

/// 广播信封：事件载荷 + 发布时刻
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: ChatEvent,
    pub timestamp: Timestamp,
}

impl EventEnvelope {
    pub fn new(event: ChatEvent, timestamp: Timestamp) -> Self {
        Self { event, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_message::MessageKind;
    use crate::value_objects::MessageBody;

    #[test]
    fn envelope_serializes_stable_name_and_timestamp() {
        let room_id = RoomId::generate();
        let sender = UserId::generate();
        let message = ChatMessage::new(
            MessageId::generate(),
            room_id,
            sender,
            Some(MessageBody::chat("hello").unwrap()),
            MessageKind::Text,
            None,
            chrono::Utc::now(),
        )
        .unwrap();

        let envelope = EventEnvelope::new(
            ChatEvent::MessageSent {
                user: sender.into(),
                message,
            },
            chrono::Utc::now(),
        );

        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event"], "message.sent");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
        assert_eq!(json["user"]["id"], serde_json::json!(sender));
        assert_eq!(json["message"]["room_id"], serde_json::json!(room_id));
    }

    #[test]
    fn deleted_event_carries_identifiers_only() {
        let envelope = EventEnvelope::new(
            ChatEvent::MessageDeleted {
                message_id: MessageId::generate(),
                room_id: RoomId::generate(),
                user: UserId::generate().into(),
            },
            chrono::Utc::now(),
        );

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"event\":\"message.deleted\""));
        assert!(!json.contains("body"));
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let event = ChatEvent::DirectMessageTyping {
            conversation_id: ConversationId::derive(
                RoomId::generate(),
                UserId::generate(),
                UserId::generate(),
            ),
            room_id: RoomId::generate(),
            user: UserId::generate().into(),
            is_typing: true,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }
}
