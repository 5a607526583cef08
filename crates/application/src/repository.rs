//! 仓储契约
//!
//! 数据库是唯一的事实来源；所有检查每次都重新查询，不在进程内缓存成员
//! 资格或在线状态（多实例部署下的正确性优先于性能）。

use async_trait::async_trait;
use thiserror::Error;

use domain::{
    ChatMessage, DirectMessage, MessageId, OnlineMember, Post, Room, RoomId, RoomMember,
    Timestamp, UserId,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("resource not found")]
    NotFound,
    #[error("resource conflict")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 原子地创建房间和房主成员行
    async fn create_with_owner(&self, room: Room, owner: RoomMember) -> RepoResult<Room>;
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Room>>;
    /// 级联删除成员、消息、私信、在线状态
    async fn delete(&self, id: RoomId) -> RepoResult<()>;
}

#[async_trait]
pub trait RoomMemberRepository: Send + Sync {
    async fn find(&self, room_id: RoomId, user_id: UserId) -> RepoResult<Option<RoomMember>>;
    /// (room_id, user_id) 唯一，存在则整行覆盖
    async fn upsert(&self, member: RoomMember) -> RepoResult<()>;
    async fn list_for_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>>;
}

#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    async fn create(&self, message: &ChatMessage) -> RepoResult<()>;
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<ChatMessage>>;
    async fn update(&self, message: &ChatMessage) -> RepoResult<()>;
    /// 群聊消息为物理删除
    async fn delete(&self, id: MessageId) -> RepoResult<()>;
    /// 最新在前，按 created_at 倒序、id 作为并列时的决胜
    async fn list_page(&self, room_id: RoomId, offset: u32, limit: u32)
        -> RepoResult<Vec<ChatMessage>>;
}

#[async_trait]
pub trait DirectMessageRepository: Send + Sync {
    async fn create(&self, message: &DirectMessage) -> RepoResult<()>;
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<DirectMessage>>;
    async fn update(&self, message: &DirectMessage) -> RepoResult<()>;
    /// 一对用户在一个房间内两个方向的消息，排除已软删除的行，最新在前
    async fn list_conversation(
        &self,
        room_id: RoomId,
        user_a: UserId,
        user_b: UserId,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<DirectMessage>>;
    /// 批量把 sender → receiver 的未读消息置为已读，返回受影响的消息 id
    async fn mark_read(
        &self,
        room_id: RoomId,
        receiver_id: UserId,
        sender_id: UserId,
        at: Timestamp,
    ) -> RepoResult<Vec<MessageId>>;
}

#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// (room_id, user_id) 唯一，last-writer-wins 刷新 last_seen
    async fn upsert(&self, member: OnlineMember) -> RepoResult<()>;
    async fn remove(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()>;
    /// last_seen >= cutoff 的行
    async fn list_seen_since(&self, room_id: RoomId, cutoff: Timestamp)
        -> RepoResult<Vec<OnlineMember>>;
    /// 周期清扫：物理删除 last_seen < cutoff 的行，返回删除数
    async fn delete_seen_before(&self, cutoff: Timestamp) -> RepoResult<u64>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> RepoResult<()>;
    async fn list_public(&self, limit: u32) -> RepoResult<Vec<Post>>;
    /// 把 published_at < cutoff 的公开帖转为私有，返回受影响行数。
    /// 只触碰 published_at 非空的行。
    async fn demote_published_before(&self, cutoff: Timestamp) -> RepoResult<u64>;
}

#[async_trait]
pub trait RoomUsageRepository: Send + Sync {
    async fn rooms_created_in(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32>;
    /// 原子自增当月计数，返回自增后的值
    async fn increment(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32>;
    /// 删除 (year, month) 早于 cutoff 所在月份的历史行，返回删除数
    async fn delete_periods_before(&self, cutoff: Timestamp) -> RepoResult<u64>;
}
