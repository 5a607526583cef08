//! 私信服务
//!
//! 发送者与接收者必须都是同一房间的已批准成员。所有私信事件
//! （发送/编辑/删除/已读）都发布到双方的个人主题并携带同一个
//! 确定性会话键；输入指示只发给接收者，且不落库。

use std::sync::Arc;

use uuid::Uuid;

use domain::{
    ChatEvent, ConversationId, DirectMessage, DomainError, EventEnvelope, MessageBody, MessageId,
    MessageKind, RoomId, Topic, UserId,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::membership::MembershipGate;
use crate::notifier::{publish_best_effort, FanoutNotifier};
use crate::repository::DirectMessageRepository;

/// 每页私信数
pub const DIRECT_MESSAGES_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub struct SendDirectMessageRequest {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: Option<String>,
    pub kind: MessageKind,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditDirectMessageRequest {
    pub room_id: Uuid,
    pub message_id: Uuid,
    pub actor_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct TypingRequest {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub is_typing: bool,
}

pub struct DirectMessageServiceDependencies {
    pub message_repository: Arc<dyn DirectMessageRepository>,
    pub gate: Arc<MembershipGate>,
    pub notifier: Arc<dyn FanoutNotifier>,
    pub clock: Arc<dyn Clock>,
}

pub struct DirectMessageService {
    deps: DirectMessageServiceDependencies,
}

impl DirectMessageService {
    pub fn new(deps: DirectMessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn send_message(
        &self,
        request: SendDirectMessageRequest,
    ) -> Result<DirectMessage, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let sender_id = UserId::from(request.sender_id);
        let receiver_id = UserId::from(request.receiver_id);

        // 双方都必须通过成员资格闸
        self.deps.gate.require_participant(room_id, sender_id).await?;
        self.deps
            .gate
            .require_participant(room_id, receiver_id)
            .await?;

        let body = request.body.map(MessageBody::direct).transpose()?;
        let message = DirectMessage::new(
            MessageId::generate(),
            room_id,
            sender_id,
            receiver_id,
            body,
            request.kind,
            request.file_url,
            self.deps.clock.now(),
        )?;

        self.deps.message_repository.create(&message).await?;

        tracing::debug!(
            room_id = %room_id,
            message_id = %message.id,
            conversation_id = %message.conversation_id(),
            "私信已写入"
        );

        self.publish_to_pair(
            sender_id,
            receiver_id,
            ChatEvent::DirectMessageSent {
                conversation_id: message.conversation_id(),
                user: sender_id.into(),
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    pub async fn edit_message(
        &self,
        request: EditDirectMessageRequest,
    ) -> Result<DirectMessage, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let actor_id = UserId::from(request.actor_id);
        self.deps.gate.require_participant(room_id, actor_id).await?;

        let mut message = self.load_room_message(room_id, request.message_id).await?;
        if !message.is_author(actor_id) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        let body = MessageBody::direct(request.body)?;
        message.edit(body, self.deps.clock.now())?;
        self.deps.message_repository.update(&message).await?;

        self.publish_to_pair(
            message.sender_id,
            message.receiver_id,
            ChatEvent::DirectMessageEdited {
                conversation_id: message.conversation_id(),
                user: actor_id.into(),
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    /// 软删除：行保留，列表中不再出现；事件只携带标识符
    pub async fn delete_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(room_id);
        let actor_id = UserId::from(actor_id);
        self.deps.gate.require_participant(room_id, actor_id).await?;

        let mut message = self.load_room_message(room_id, message_id).await?;
        if !message.is_author(actor_id) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        message.mark_deleted(self.deps.clock.now());
        self.deps.message_repository.update(&message).await?;

        self.publish_to_pair(
            message.sender_id,
            message.receiver_id,
            ChatEvent::DirectMessageDeleted {
                conversation_id: message.conversation_id(),
                message_id: message.id,
                room_id,
                user: actor_id.into(),
            },
        )
        .await;

        Ok(())
    }

    /// 会话分页（排除已删除，最新在前）
    pub async fn list_conversation(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
        other_user_id: Uuid,
        page: u32,
    ) -> Result<Vec<DirectMessage>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        let viewer_id = UserId::from(viewer_id);
        self.deps.gate.require_participant(room_id, viewer_id).await?;

        let page = page.max(1);
        let offset = (page - 1) * DIRECT_MESSAGES_PAGE_SIZE;
        let messages = self
            .deps
            .message_repository
            .list_conversation(
                room_id,
                viewer_id,
                UserId::from(other_user_id),
                offset,
                DIRECT_MESSAGES_PAGE_SIZE,
            )
            .await?;
        Ok(messages)
    }

    /// 批量已读：把 other → viewer 的未读消息全部置为已读，
    /// 已读回执发布到**双方**的个人主题，未读计数才能实时更新。
    pub async fn mark_read(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<usize, ApplicationError> {
        let room_id = RoomId::from(room_id);
        let viewer_id = UserId::from(viewer_id);
        let other_user_id = UserId::from(other_user_id);
        self.deps.gate.require_participant(room_id, viewer_id).await?;

        let now = self.deps.clock.now();
        let message_ids = self
            .deps
            .message_repository
            .mark_read(room_id, viewer_id, other_user_id, now)
            .await?;

        if message_ids.is_empty() {
            return Ok(0);
        }

        let count = message_ids.len();
        self.publish_to_pair(
            viewer_id,
            other_user_id,
            ChatEvent::DirectMessageRead {
                conversation_id: ConversationId::derive(room_id, viewer_id, other_user_id),
                room_id,
                reader: viewer_id.into(),
                sender: other_user_id.into(),
                message_ids,
            },
        )
        .await;

        Ok(count)
    }

    /// 输入指示：瞬态，不持久化，只发给接收者的个人主题。
    /// 最近值胜出，乱序投递不做调和。
    pub async fn typing(&self, request: TypingRequest) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let sender_id = UserId::from(request.sender_id);
        let receiver_id = UserId::from(request.receiver_id);

        if sender_id == receiver_id {
            return Err(DomainError::operation_not_allowed(
                "cannot send a typing indicator to yourself",
            )
            .into());
        }
        self.deps.gate.require_participant(room_id, sender_id).await?;

        let envelope = EventEnvelope::new(
            ChatEvent::DirectMessageTyping {
                conversation_id: ConversationId::derive(room_id, sender_id, receiver_id),
                room_id,
                user: sender_id.into(),
                is_typing: request.is_typing,
            },
            self.deps.clock.now(),
        );
        publish_best_effort(
            self.deps.notifier.as_ref(),
            Topic::User(receiver_id),
            envelope,
        )
        .await;

        Ok(())
    }

    async fn load_room_message(
        &self,
        room_id: RoomId,
        message_id: Uuid,
    ) -> Result<DirectMessage, ApplicationError> {
        let message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(message_id))
            .await?
            .ok_or(DomainError::MessageNotFound)?;

        if message.room_id != room_id || message.is_deleted {
            return Err(DomainError::MessageNotFound.into());
        }
        Ok(message)
    }

    async fn publish_to_pair(&self, a: UserId, b: UserId, event: ChatEvent) {
        let now = self.deps.clock.now();
        publish_best_effort(
            self.deps.notifier.as_ref(),
            Topic::User(a),
            EventEnvelope::new(event.clone(), now),
        )
        .await;
        publish_best_effort(
            self.deps.notifier.as_ref(),
            Topic::User(b),
            EventEnvelope::new(event, now),
        )
        .await;
    }
}
