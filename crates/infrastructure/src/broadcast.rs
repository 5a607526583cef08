//! 事件扇出实现
//!
//! 单实例用进程内 broadcast 通道；多实例经 Redis Pub/Sub 中转：
//! 发布走 Redis，每个实例的订阅端把收到的信封转投本地通道，
//! 本实例的 WebSocket 会话统一从本地通道消费。
//! 频道名就是主题字符串，载荷是 JSON 信封。at-most-once，无持久化。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use application::{BroadcastError, FanoutNotifier};
use domain::{EventEnvelope, Topic};

/// 订阅端覆盖全部主题前缀
const RELAY_PATTERNS: [&str; 4] = ["chat.room.*", "user.*", "product.*", "store.products"];

/// 进程内扇出，WebSocket 会话从这里订阅
#[derive(Clone)]
pub struct LocalFanoutNotifier {
    sender: broadcast::Sender<(Topic, EventEnvelope)>,
}

impl LocalFanoutNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(Topic, EventEnvelope)> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl FanoutNotifier for LocalFanoutNotifier {
    async fn publish(&self, topic: Topic, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send((topic, envelope))
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(())
    }
}

/// Redis Pub/Sub 发布端，与 [`RedisEventRelay`] 成对使用
pub struct RedisFanoutNotifier {
    connection: ConnectionManager,
}

impl RedisFanoutNotifier {
    pub async fn connect(url: &str) -> Result<Self, BroadcastError> {
        let client =
            redis::Client::open(url).map_err(|err| BroadcastError::failed(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        tracing::info!("Redis 扇出连接已建立");
        Ok(Self { connection })
    }
}

#[async_trait]
impl FanoutNotifier for RedisFanoutNotifier {
    async fn publish(&self, topic: Topic, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        let payload = serde_json::to_string(&envelope)
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        let mut connection = self.connection.clone();
        let _subscribers: i64 = redis::cmd("PUBLISH")
            .arg(topic.to_string())
            .arg(payload)
            .query_async(&mut connection)
            .await
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(())
    }
}

/// Redis 订阅端：收到的信封转投本地通道，本实例自己发布的
/// 事件同样经由这里回到本地，避免双路投递造成重复。
pub struct RedisEventRelay {
    client: redis::Client,
    local: LocalFanoutNotifier,
}

impl RedisEventRelay {
    pub fn new(url: &str, local: LocalFanoutNotifier) -> Result<Self, BroadcastError> {
        let client =
            redis::Client::open(url).map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(Self { client, local })
    }

    /// 断线后等待重连，不丢进程
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.run_once().await {
                    Ok(()) => tracing::warn!("Redis 订阅流结束，准备重连"),
                    Err(err) => tracing::warn!(error = %err, "Redis 订阅失败，准备重连"),
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        })
    }

    async fn run_once(&self) -> Result<(), redis::RedisError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.psubscribe(&RELAY_PATTERNS[..]).await?;
        tracing::info!("Redis 事件中转已订阅");

        let mut stream = pubsub.on_message();
        while let Some(message) = stream.next().await {
            let channel = message.get_channel_name().to_owned();
            let payload: String = match message.get_payload() {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(channel = %channel, error = %err, "载荷读取失败，已跳过");
                    continue;
                }
            };
            relay_payload(&self.local, &channel, &payload).await;
        }
        Ok(())
    }
}

/// 把一条 Redis 消息解析后转投本地通道；解析失败记日志后跳过
async fn relay_payload(local: &LocalFanoutNotifier, channel: &str, payload: &str) {
    let Ok(topic) = channel.parse::<Topic>() else {
        tracing::warn!(channel = %channel, "未知频道，已跳过");
        return;
    };
    let envelope: EventEnvelope = match serde_json::from_str(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(channel = %channel, error = %err, "信封反序列化失败，已跳过");
            return;
        }
    };
    if let Err(err) = local.publish(topic, envelope).await {
        tracing::warn!(channel = %channel, error = %err, "本地转投失败");
    }
}

/// 本地 + 可选 Redis 的组合扇出
///
/// 配了 Redis 时只发 Redis，本地投递由 [`RedisEventRelay`] 统一完成
/// （包括本实例自己发布的事件）；没配 Redis 时直接发本地通道。
pub struct FanoutPair {
    local: Arc<LocalFanoutNotifier>,
    remote: Option<Arc<RedisFanoutNotifier>>,
}

impl FanoutPair {
    pub fn new(local: Arc<LocalFanoutNotifier>, remote: Option<Arc<RedisFanoutNotifier>>) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl FanoutNotifier for FanoutPair {
    async fn publish(&self, topic: Topic, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        match &self.remote {
            Some(remote) => remote.publish(topic, envelope).await,
            None => self.local.publish(topic, envelope).await,
        }
    }
}
