use async_trait::async_trait;
use domain::{EventEnvelope, Topic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 扇出通知契约：at-most-once、尽力而为，无持久化与重放。
/// 断线的订阅者错过的事件通过拉取接口补齐。
#[async_trait]
pub trait FanoutNotifier: Send + Sync {
    async fn publish(&self, topic: Topic, envelope: EventEnvelope) -> Result<(), BroadcastError>;
}

/// 尽力而为发布
///
/// 数据写入是事实来源，事件只是通知：发布失败记日志后忽略，
/// 绝不回滚已提交的变更。
pub async fn publish_best_effort(
    notifier: &dyn FanoutNotifier,
    topic: Topic,
    envelope: EventEnvelope,
) {
    let event_name = envelope.event.name();
    if let Err(err) = notifier.publish(topic, envelope).await {
        tracing::warn!(
            topic = %topic,
            event = event_name,
            error = %err,
            "事件广播失败，已忽略"
        );
    }
}
