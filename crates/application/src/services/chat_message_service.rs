use std::sync::Arc;

use uuid::Uuid;

use domain::{
    ChatEvent, ChatMessage, DomainError, EventEnvelope, MessageBody, MessageId, MessageKind,
    RoomId, Topic, UserId,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::membership::MembershipGate;
use crate::notifier::{publish_best_effort, FanoutNotifier};
use crate::repository::ChatMessageRepository;

/// 每页消息数
pub const MESSAGES_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub struct PostChatMessageRequest {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: Option<String>,
    pub kind: MessageKind,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditChatMessageRequest {
    pub room_id: Uuid,
    pub message_id: Uuid,
    pub actor_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct DeleteChatMessageRequest {
    pub room_id: Uuid,
    pub message_id: Uuid,
    pub actor_id: Uuid,
}

pub struct ChatMessageServiceDependencies {
    pub message_repository: Arc<dyn ChatMessageRepository>,
    pub gate: Arc<MembershipGate>,
    pub notifier: Arc<dyn FanoutNotifier>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatMessageService {
    deps: ChatMessageServiceDependencies,
}

impl ChatMessageService {
    pub fn new(deps: ChatMessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送群聊消息：闸 → 校验 → 写入（status = Sent）→ 尽力而为广播
    pub async fn post_message(
        &self,
        request: PostChatMessageRequest,
    ) -> Result<ChatMessage, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let sender_id = UserId::from(request.sender_id);
        self.deps.gate.require_participant(room_id, sender_id).await?;

        let body = request.body.map(MessageBody::chat).transpose()?;
        let now = self.deps.clock.now();

        let message = ChatMessage::new(
            MessageId::generate(),
            room_id,
            sender_id,
            body,
            request.kind,
            request.file_url,
            now,
        )?;

        self.deps.message_repository.create(&message).await?;

        tracing::debug!(
            room_id = %room_id,
            message_id = %message.id,
            kind = ?message.kind,
            "群聊消息已写入"
        );

        self.publish(
            room_id,
            ChatEvent::MessageSent {
                user: sender_id.into(),
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    /// 编辑消息：仅作者，仅文本类型
    pub async fn edit_message(
        &self,
        request: EditChatMessageRequest,
    ) -> Result<ChatMessage, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let actor_id = UserId::from(request.actor_id);
        self.deps.gate.require_participant(room_id, actor_id).await?;

        let mut message = self.load_room_message(room_id, request.message_id).await?;
        if !message.is_author(actor_id) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        let body = MessageBody::chat(request.body)?;
        message.edit(body, self.deps.clock.now())?;
        self.deps.message_repository.update(&message).await?;

        self.publish(
            room_id,
            ChatEvent::MessageEdited {
                user: actor_id.into(),
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    /// 删除消息：仅作者；物理删除；事件只携带标识符，不携带正文
    pub async fn delete_message(
        &self,
        request: DeleteChatMessageRequest,
    ) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let actor_id = UserId::from(request.actor_id);
        self.deps.gate.require_participant(room_id, actor_id).await?;

        let message = self.load_room_message(room_id, request.message_id).await?;
        if !message.is_author(actor_id) {
            return Err(DomainError::NotMessageAuthor.into());
        }

        self.deps.message_repository.delete(message.id).await?;

        self.publish(
            room_id,
            ChatEvent::MessageDeleted {
                message_id: message.id,
                room_id,
                user: actor_id.into(),
            },
        )
        .await;

        Ok(())
    }

    /// 最新在前的分页列表；并发插入下总数不要求精确
    pub async fn list_messages(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
        page: u32,
    ) -> Result<Vec<ChatMessage>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        self.deps
            .gate
            .require_participant(room_id, UserId::from(viewer_id))
            .await?;

        let page = page.max(1);
        let offset = (page - 1) * MESSAGES_PAGE_SIZE;
        let messages = self
            .deps
            .message_repository
            .list_page(room_id, offset, MESSAGES_PAGE_SIZE)
            .await?;
        Ok(messages)
    }

    async fn load_room_message(
        &self,
        room_id: RoomId,
        message_id: Uuid,
    ) -> Result<ChatMessage, ApplicationError> {
        let message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(message_id))
            .await?
            .ok_or(DomainError::MessageNotFound)?;

        // 跨房间的消息 id 视为不存在
        if message.room_id != room_id {
            return Err(DomainError::MessageNotFound.into());
        }
        Ok(message)
    }

    async fn publish(&self, room_id: RoomId, event: ChatEvent) {
        let envelope = EventEnvelope::new(event, self.deps.clock.now());
        publish_best_effort(self.deps.notifier.as_ref(), Topic::Room(room_id), envelope).await;
    }
}
