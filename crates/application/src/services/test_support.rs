//! 服务单元测试的内存假件
//!
//! 与生产实现遵守相同的契约（排序、唯一键、软删除过滤），
//! 测试无需数据库即可覆盖业务语义。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration};

use domain::{
    ChatMessage, DirectMessage, EventEnvelope, MemberRole, MemberStatus, MessageId, OnlineMember,
    PasswordHash, Post, Room, RoomId, RoomKind, RoomMember, Timestamp, Topic, UserId,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::membership::MembershipGate;
use crate::notifier::{BroadcastError, FanoutNotifier};
use crate::password::{PasswordHasher, PasswordHasherError};
use crate::repository::{
    ChatMessageRepository, DirectMessageRepository, PostRepository, PresenceRepository,
    RepoResult, RoomMemberRepository, RoomRepository, RoomUsageRepository,
};
use crate::storage::{BlobStorage, StorageError};

// ---------------------------------------------------------------- clock

pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

// ------------------------------------------------------------- notifier

#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<(Topic, EventEnvelope)>>,
}

impl RecordingNotifier {
    pub fn published(&self) -> Vec<(Topic, EventEnvelope)> {
        self.published.lock().unwrap().clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, envelope)| envelope.event.name())
            .collect()
    }
}

#[async_trait]
impl FanoutNotifier for RecordingNotifier {
    async fn publish(&self, topic: Topic, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        self.published.lock().unwrap().push((topic, envelope));
        Ok(())
    }
}

/// 总是失败的通知器，验证广播失败不回滚数据写入
#[derive(Default)]
pub struct FailingNotifier;

#[async_trait]
impl FanoutNotifier for FailingNotifier {
    async fn publish(&self, _: Topic, _: EventEnvelope) -> Result<(), BroadcastError> {
        Err(BroadcastError::failed("wire down"))
    }
}

// ------------------------------------------------------------- password

pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{raw}"))
            .map_err(|err| PasswordHasherError::Hash(err.to_string()))
    }

    async fn verify(
        &self,
        raw: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hash.as_str() == format!("plain:{raw}"))
    }
}

// ---------------------------------------------------------- repositories

#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
    members: Arc<InMemoryRoomMemberRepository>,
}

impl InMemoryRoomRepository {
    pub fn new(members: Arc<InMemoryRoomMemberRepository>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            members,
        }
    }

    pub fn insert(&self, room: Room) {
        self.rooms.lock().unwrap().insert(room.id, room);
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_with_owner(&self, room: Room, owner: RoomMember) -> RepoResult<Room> {
        self.members
            .members
            .lock()
            .unwrap()
            .insert((owner.room_id, owner.user_id), owner);
        self.rooms.lock().unwrap().insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        Ok(self.rooms.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Room>> {
        Ok(self
            .rooms
            .lock()
            .unwrap()
            .values()
            .find(|room| room.name == name)
            .cloned())
    }

    async fn delete(&self, id: RoomId) -> RepoResult<()> {
        self.rooms.lock().unwrap().remove(&id);
        self.members
            .members
            .lock()
            .unwrap()
            .retain(|(room_id, _), _| *room_id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRoomMemberRepository {
    members: Mutex<HashMap<(RoomId, UserId), RoomMember>>,
}

#[async_trait]
impl RoomMemberRepository for InMemoryRoomMemberRepository {
    async fn find(&self, room_id: RoomId, user_id: UserId) -> RepoResult<Option<RoomMember>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&(room_id, user_id))
            .cloned())
    }

    async fn upsert(&self, member: RoomMember) -> RepoResult<()> {
        self.members
            .lock()
            .unwrap()
            .insert((member.room_id, member.user_id), member);
        Ok(())
    }

    async fn list_for_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryChatMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl ChatMessageRepository for InMemoryChatMessageRepository {
    async fn create(&self, message: &ChatMessage) -> RepoResult<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<ChatMessage>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn update(&self, message: &ChatMessage) -> RepoResult<()> {
        let mut messages = self.messages.lock().unwrap();
        if let Some(slot) = messages.iter_mut().find(|m| m.id == message.id) {
            *slot = message.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> RepoResult<()> {
        self.messages.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn list_page(
        &self,
        room_id: RoomId,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<ChatMessage>> {
        let mut page: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        // 最新在前，created_at 相同时 id 决胜
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(page
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryDirectMessageRepository {
    messages: Mutex<Vec<DirectMessage>>,
}

#[async_trait]
impl DirectMessageRepository for InMemoryDirectMessageRepository {
    async fn create(&self, message: &DirectMessage) -> RepoResult<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<DirectMessage>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn update(&self, message: &DirectMessage) -> RepoResult<()> {
        let mut messages = self.messages.lock().unwrap();
        if let Some(slot) = messages.iter_mut().find(|m| m.id == message.id) {
            *slot = message.clone();
        }
        Ok(())
    }

    async fn list_conversation(
        &self,
        room_id: RoomId,
        user_a: UserId,
        user_b: UserId,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<DirectMessage>> {
        let mut page: Vec<DirectMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                m.room_id == room_id
                    && !m.is_deleted
                    && ((m.sender_id == user_a && m.receiver_id == user_b)
                        || (m.sender_id == user_b && m.receiver_id == user_a))
            })
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(page
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn mark_read(
        &self,
        room_id: RoomId,
        receiver_id: UserId,
        sender_id: UserId,
        at: Timestamp,
    ) -> RepoResult<Vec<MessageId>> {
        let mut updated = Vec::new();
        let mut messages = self.messages.lock().unwrap();
        for message in messages.iter_mut() {
            if message.room_id == room_id
                && message.sender_id == sender_id
                && message.receiver_id == receiver_id
                && !message.is_deleted
                && message.read_at.is_none()
            {
                message.read_at = Some(at);
                updated.push(message.id);
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryPresenceRepository {
    rows: Mutex<HashMap<(RoomId, UserId), OnlineMember>>,
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn upsert(&self, member: OnlineMember) -> RepoResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert((member.room_id, member.user_id), member);
        Ok(())
    }

    async fn remove(&self, room_id: RoomId, user_id: UserId) -> RepoResult<()> {
        self.rows.lock().unwrap().remove(&(room_id, user_id));
        Ok(())
    }

    async fn list_seen_since(
        &self,
        room_id: RoomId,
        cutoff: Timestamp,
    ) -> RepoResult<Vec<OnlineMember>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.room_id == room_id && m.last_seen >= cutoff)
            .cloned()
            .collect())
    }

    async fn delete_seen_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, m| m.last_seen >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn all(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: &Post) -> RepoResult<()> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn list_public(&self, limit: u32) -> RepoResult<Vec<Post>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.visibility == domain::PostVisibility::Public)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn demote_published_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        let mut demoted = 0;
        let mut posts = self.posts.lock().unwrap();
        for post in posts.iter_mut() {
            if post.visibility == domain::PostVisibility::Public
                && post.published_at.is_some_and(|at| at < cutoff)
            {
                post.visibility = domain::PostVisibility::Private;
                demoted += 1;
            }
        }
        Ok(demoted)
    }
}

#[derive(Default)]
pub struct InMemoryRoomUsageRepository {
    counters: Mutex<HashMap<(UserId, i32, u32), u32>>,
}

#[async_trait]
impl RoomUsageRepository for InMemoryRoomUsageRepository {
    async fn rooms_created_in(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32> {
        Ok(*self
            .counters
            .lock()
            .unwrap()
            .get(&(user_id, year, month))
            .unwrap_or(&0))
    }

    async fn increment(&self, user_id: UserId, year: i32, month: u32) -> RepoResult<u32> {
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry((user_id, year, month)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn delete_periods_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        let cutoff_period = (cutoff.year(), cutoff.month());
        let mut counters = self.counters.lock().unwrap();
        let before = counters.len();
        counters.retain(|(_, year, month), _| (*year, *month) >= cutoff_period);
        Ok((before - counters.len()) as u64)
    }
}

// --------------------------------------------------------------- storage

#[derive(Default)]
pub struct MemoryBlobStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_owned(), bytes.to_vec());
        Ok(format!("/files/{path}"))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

// ----------------------------------------------------------- test world

/// 预装好全部假件的测试环境
pub struct TestWorld {
    pub rooms: Arc<InMemoryRoomRepository>,
    pub members: Arc<InMemoryRoomMemberRepository>,
    pub chat_messages: Arc<InMemoryChatMessageRepository>,
    pub direct_messages: Arc<InMemoryDirectMessageRepository>,
    pub presence: Arc<InMemoryPresenceRepository>,
    pub posts: Arc<InMemoryPostRepository>,
    pub usage: Arc<InMemoryRoomUsageRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub gate: Arc<MembershipGate>,
}

impl TestWorld {
    pub fn new() -> Self {
        let members = Arc::new(InMemoryRoomMemberRepository::default());
        let rooms = Arc::new(InMemoryRoomRepository::new(members.clone()));
        let gate = Arc::new(MembershipGate::new(rooms.clone(), members.clone()));
        Self {
            rooms,
            members,
            chat_messages: Arc::new(InMemoryChatMessageRepository::default()),
            direct_messages: Arc::new(InMemoryDirectMessageRepository::default()),
            presence: Arc::new(InMemoryPresenceRepository::default()),
            posts: Arc::new(InMemoryPostRepository::default()),
            usage: Arc::new(InMemoryRoomUsageRepository::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            clock: Arc::new(FixedClock::new(chrono::Utc::now())),
            gate,
        }
    }

    /// 直接种一个公开房间
    pub fn seed_room(&self, owner_id: UserId) -> Room {
        let room = Room::new(
            RoomId::generate(),
            owner_id,
            format!("room-{}", RoomId::generate()),
            RoomKind::Public,
            None,
            false,
            self.clock.now(),
        )
        .unwrap();
        self.rooms.insert(room.clone());
        room
    }

    /// 直接种一条已批准成员行
    pub async fn seed_approved_member(&self, room_id: RoomId, user_id: UserId) {
        self.members
            .upsert(RoomMember::new(
                room_id,
                user_id,
                MemberRole::Member,
                MemberStatus::Approved,
                self.clock.now(),
            ))
            .await
            .unwrap();
    }
}

/// 便捷断言：结果是给定领域错误
pub fn assert_domain_error(result: Result<impl std::fmt::Debug, ApplicationError>, check: fn(&domain::DomainError) -> bool) {
    match result {
        Err(ApplicationError::Domain(ref err)) if check(err) => {}
        other => panic!("expected domain error, got {other:?}"),
    }
}
