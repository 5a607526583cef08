pub mod chat_message_service;
pub mod cleanup_service;
pub mod direct_message_service;
pub mod post_service;
pub mod presence_service;
pub mod room_service;
pub mod upload_service;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod cleanup_service_tests;
#[cfg(test)]
mod direct_message_service_tests;
#[cfg(test)]
mod post_service_tests;

pub use chat_message_service::{
    ChatMessageService, ChatMessageServiceDependencies, DeleteChatMessageRequest,
    EditChatMessageRequest, PostChatMessageRequest,
};
pub use cleanup_service::{CleanupService, CleanupServiceDependencies};
pub use direct_message_service::{
    DirectMessageService, DirectMessageServiceDependencies, EditDirectMessageRequest,
    SendDirectMessageRequest, TypingRequest,
};
pub use post_service::{CreatePostRequest, PostService, PostServiceDependencies};
pub use presence_service::{PresenceService, PresenceServiceDependencies};
pub use room_service::{
    CreateRoomRequest, JoinRoomRequest, MemberStatusAction, RoomService,
    RoomServiceDependencies, UpdateMemberStatusRequest,
};
pub use upload_service::{StoredUpload, UploadRequest, UploadService, UploadServiceDependencies};
