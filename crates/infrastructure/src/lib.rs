//! 基础设施层实现。
//!
//! 提供数据库仓储、事件扇出、对象存储与周期清扫调度等适配器，
//! 实现应用层定义的接口。

pub mod broadcast;
pub mod db;
pub mod scheduler;
pub mod storage;

pub use broadcast::{FanoutPair, LocalFanoutNotifier, RedisEventRelay, RedisFanoutNotifier};
pub use db::repositories::{
    PgChatMessageRepository, PgDirectMessageRepository, PgPostRepository, PgPresenceRepository,
    PgRoomMemberRepository, PgRoomRepository, PgRoomUsageRepository,
};
pub use db::{create_pg_pool, DbPool};
pub use scheduler::{CleanupSchedule, CleanupScheduler};
pub use storage::FsBlobStorage;
