//! Postgres 仓储实现
//!
//! 枚举以小写 TEXT 落库，行结构体与领域实体之间显式转换；
//! 未知的枚举值视为存储层错误浮出，而不是静默回退。

use application::RepositoryError;

mod chat_message_repository_impl;
mod direct_message_repository_impl;
mod post_repository_impl;
mod presence_repository_impl;
mod room_member_repository_impl;
mod room_repository_impl;
mod room_usage_repository_impl;

pub use chat_message_repository_impl::PgChatMessageRepository;
pub use direct_message_repository_impl::PgDirectMessageRepository;
pub use post_repository_impl::PgPostRepository;
pub use presence_repository_impl::PgPresenceRepository;
pub use room_member_repository_impl::PgRoomMemberRepository;
pub use room_repository_impl::PgRoomRepository;
pub use room_usage_repository_impl::PgRoomUsageRepository;

/// sqlx 错误到仓储错误的统一映射，唯一键冲突单独区分
pub(crate) fn map_sqlx(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

pub(crate) fn unknown_value(column: &str, value: &str) -> RepositoryError {
    RepositoryError::storage(format!("unknown {column} value: {value}"))
}
