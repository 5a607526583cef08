use std::sync::Arc;

use application::{
    ChatMessageService, DirectMessageService, MembershipGate, PostService, PresenceService,
    RoomService, UploadService,
};
use infrastructure::LocalFanoutNotifier;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub chat_message_service: Arc<ChatMessageService>,
    pub direct_message_service: Arc<DirectMessageService>,
    pub presence_service: Arc<PresenceService>,
    pub post_service: Arc<PostService>,
    pub upload_service: Arc<UploadService>,
    /// WebSocket 订阅鉴权使用的成员资格闸
    pub gate: Arc<MembershipGate>,
    /// 本实例的进程内扇出，WebSocket 会话从这里订阅
    pub fanout: LocalFanoutNotifier,
    pub jwt_service: Arc<JwtService>,
}
