//! 在线状态服务
//!
//! 在线状态是带 TTL 的数据库行而不是进程内注册表：多实例部署下所有
//! 实例观察同一份状态，不需要粘性会话。"算在线"的窗口与清扫 TTL 是
//! 两个独立参数（见 config），此处只使用前者。

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use domain::{ChatEvent, EventEnvelope, OnlineMember, RoomId, Topic, UserId};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::membership::MembershipGate;
use crate::notifier::{publish_best_effort, FanoutNotifier};
use crate::repository::PresenceRepository;

pub struct PresenceServiceDependencies {
    pub presence_repository: Arc<dyn PresenceRepository>,
    pub gate: Arc<MembershipGate>,
    pub notifier: Arc<dyn FanoutNotifier>,
    pub clock: Arc<dyn Clock>,
    /// "算在线"窗口（默认 5 分钟）
    pub online_window: Duration,
}

pub struct PresenceService {
    deps: PresenceServiceDependencies,
}

impl PresenceService {
    pub fn new(deps: PresenceServiceDependencies) -> Self {
        Self { deps }
    }

    /// 上线：刷新 last_seen 并返回当前在线列表
    pub async fn mark_online(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<OnlineMember>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        let user_id = UserId::from(user_id);
        self.deps.gate.require_participant(room_id, user_id).await?;

        let now = self.deps.clock.now();
        self.deps
            .presence_repository
            .upsert(OnlineMember::new(room_id, user_id, now))
            .await?;

        let online = self.list_online_inner(room_id).await?;
        self.publish_status(room_id, user_id, true, &online).await;
        Ok(online)
    }

    /// 下线：立即删除行并返回更新后的在线列表
    pub async fn mark_offline(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<OnlineMember>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        let user_id = UserId::from(user_id);
        self.deps.gate.require_participant(room_id, user_id).await?;

        self.deps.presence_repository.remove(room_id, user_id).await?;

        let online = self.list_online_inner(room_id).await?;
        self.publish_status(room_id, user_id, false, &online).await;
        Ok(online)
    }

    /// 心跳：只刷新 last_seen，不重新拉取列表
    pub async fn heartbeat(&self, room_id: Uuid, user_id: Uuid) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(room_id);
        let user_id = UserId::from(user_id);
        self.deps.gate.require_participant(room_id, user_id).await?;

        let now = self.deps.clock.now();
        self.deps
            .presence_repository
            .upsert(OnlineMember::new(room_id, user_id, now))
            .await?;
        Ok(())
    }

    /// 当前在线列表：last_seen 在窗口内的行。
    /// 行可能在逻辑下线后仍存在（等待清扫），查询时按窗口过滤即可。
    pub async fn list_online(
        &self,
        room_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<OnlineMember>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        self.deps
            .gate
            .require_participant(room_id, UserId::from(viewer_id))
            .await?;
        self.list_online_inner(room_id).await
    }

    async fn list_online_inner(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<OnlineMember>, ApplicationError> {
        let cutoff = self.deps.clock.now() - self.deps.online_window;
        let online = self
            .deps
            .presence_repository
            .list_seen_since(room_id, cutoff)
            .await?;
        Ok(online)
    }

    async fn publish_status(
        &self,
        room_id: RoomId,
        user_id: UserId,
        is_online: bool,
        online: &[OnlineMember],
    ) {
        let envelope = EventEnvelope::new(
            ChatEvent::UserOnlineStatus {
                room_id,
                user: user_id.into(),
                is_online,
                online_user_ids: online.iter().map(|m| m.user_id).collect(),
            },
            self.deps.clock.now(),
        );
        publish_best_effort(self.deps.notifier.as_ref(), Topic::Room(room_id), envelope).await;
    }
}
