//! 周期清扫调度
//!
//! 三个任务各跑各的 interval，互不阻塞；单次失败记日志后等下一个
//! 周期重试，任务本身幂等。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use application::CleanupService;

#[derive(Debug, Clone, Copy)]
pub struct CleanupSchedule {
    /// 在线状态清扫间隔（默认 5 分钟）
    pub presence_sweep_interval: Duration,
    /// 建房用量历史清理间隔（默认每周）
    pub usage_prune_interval: Duration,
    /// 帖子可见性衰减间隔（默认每小时）
    pub post_decay_interval: Duration,
}

pub struct CleanupScheduler {
    service: Arc<CleanupService>,
    schedule: CleanupSchedule,
}

impl CleanupScheduler {
    pub fn new(service: Arc<CleanupService>, schedule: CleanupSchedule) -> Self {
        Self { service, schedule }
    }

    /// 启动三个后台任务，返回句柄供关停时 abort
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let presence = {
            let service = self.service.clone();
            spawn_job(
                "presence-sweep",
                self.schedule.presence_sweep_interval,
                move || {
                    let service = service.clone();
                    async move { service.sweep_presence().await }
                },
            )
        };
        let usage = {
            let service = self.service.clone();
            spawn_job(
                "usage-prune",
                self.schedule.usage_prune_interval,
                move || {
                    let service = service.clone();
                    async move { service.prune_room_usage().await }
                },
            )
        };
        let posts = {
            let service = self.service;
            spawn_job("post-decay", self.schedule.post_decay_interval, move || {
                let service = service.clone();
                async move { service.decay_post_visibility().await }
            })
        };

        vec![presence, usage, posts]
    }
}

fn spawn_job<F, Fut>(name: &'static str, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<u64, application::ApplicationError>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 首个 tick 立即触发，进程重启后不等一个完整周期
        loop {
            interval.tick().await;
            match job().await {
                Ok(count) => tracing::debug!(job = name, count, "清扫任务完成"),
                Err(err) => tracing::warn!(job = name, error = %err, "清扫任务失败，等待下一周期"),
            }
        }
    })
}
