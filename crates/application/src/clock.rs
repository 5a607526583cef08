use domain::Timestamp;

/// 时间来源抽象，服务不直接调用 `Utc::now()`，便于测试注入固定时钟。
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}
