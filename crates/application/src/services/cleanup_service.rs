//! 周期清扫任务
//!
//! 三个互相独立的幂等任务，跳过或重试都安全；整个清扫不在单个事务内，
//! 行级删除/更新各自可重试。每个任务返回并记录处理行数。

use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::repository::{PostRepository, PresenceRepository, RoomUsageRepository};

pub struct CleanupServiceDependencies {
    pub presence_repository: Arc<dyn PresenceRepository>,
    pub usage_repository: Arc<dyn RoomUsageRepository>,
    pub post_repository: Arc<dyn PostRepository>,
    pub clock: Arc<dyn Clock>,
    /// 在线行物理删除 TTL（默认 8 分钟，与"算在线"的 5 分钟窗口是独立参数）
    pub presence_sweep_ttl: Duration,
    /// 建房用量历史保留时长（默认 3 个月）
    pub usage_retention: Duration,
    /// 公开帖可见性衰减时长（默认 24 小时）
    pub post_decay: Duration,
}

pub struct CleanupService {
    deps: CleanupServiceDependencies,
}

impl CleanupService {
    pub fn new(deps: CleanupServiceDependencies) -> Self {
        Self { deps }
    }

    /// 在线状态清扫：删除 last_seen 超过 TTL 的行
    pub async fn sweep_presence(&self) -> Result<u64, ApplicationError> {
        let cutoff = self.deps.clock.now() - self.deps.presence_sweep_ttl;
        let removed = self
            .deps
            .presence_repository
            .delete_seen_before(cutoff)
            .await?;
        tracing::info!(removed, "在线状态清扫完成");
        Ok(removed)
    }

    /// 用量保留：删除 3 个月前的建房用量历史行
    pub async fn prune_room_usage(&self) -> Result<u64, ApplicationError> {
        let cutoff = self.deps.clock.now() - self.deps.usage_retention;
        let removed = self
            .deps
            .usage_repository
            .delete_periods_before(cutoff)
            .await?;
        tracing::info!(removed, "建房用量历史清理完成");
        Ok(removed)
    }

    /// 可见性衰减：发布超过 24 小时的公开帖转为私有
    /// （只影响 published_at 非空的行）
    pub async fn decay_post_visibility(&self) -> Result<u64, ApplicationError> {
        let cutoff = self.deps.clock.now() - self.deps.post_decay;
        let demoted = self
            .deps
            .post_repository
            .demote_published_before(cutoff)
            .await?;
        tracing::info!(demoted, "帖子可见性衰减完成");
        Ok(demoted)
    }
}
