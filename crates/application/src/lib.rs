//! 应用层：业务服务、仓储契约与扇出通知契约
//!
//! 所有外部协作者（数据库、广播、对象存储、密码哈希、时钟）都隐藏在
//! trait 后面，服务只编排业务规则。

pub mod clock;
pub mod error;
pub mod membership;
pub mod notifier;
pub mod password;
pub mod repository;
pub mod services;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use membership::MembershipGate;
pub use notifier::{publish_best_effort, BroadcastError, FanoutNotifier};
pub use password::{BcryptPasswordHasher, PasswordHasher, PasswordHasherError};
pub use repository::{
    ChatMessageRepository, DirectMessageRepository, PostRepository, PresenceRepository,
    RepoResult, RepositoryError, RoomMemberRepository, RoomRepository, RoomUsageRepository,
};
pub use services::{
    ChatMessageService, ChatMessageServiceDependencies, CleanupService,
    CleanupServiceDependencies, CreatePostRequest, CreateRoomRequest, DeleteChatMessageRequest,
    DirectMessageService, DirectMessageServiceDependencies, EditChatMessageRequest,
    EditDirectMessageRequest, JoinRoomRequest, MemberStatusAction, PostChatMessageRequest,
    PostService, PostServiceDependencies, PresenceService, PresenceServiceDependencies,
    RoomService, RoomServiceDependencies, SendDirectMessageRequest, StoredUpload, TypingRequest,
    UpdateMemberStatusRequest, UploadRequest, UploadService, UploadServiceDependencies,
};
pub use storage::{BlobStorage, StorageError};
