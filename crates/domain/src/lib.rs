//! 房间/聊天协调服务核心领域模型
//!
//! 包含房间、成员、消息、在线状态等核心实体，以及广播事件的固定线格式。

pub mod attachment;
pub mod chat_message;
pub mod direct_message;
pub mod errors;
pub mod events;
pub mod post;
pub mod presence;
pub mod room;
pub mod room_member;
pub mod room_usage;
pub mod value_objects;

// 重新导出常用类型
pub use attachment::*;
pub use chat_message::*;
pub use direct_message::*;
pub use errors::*;
pub use events::*;
pub use post::*;
pub use presence::*;
pub use room::*;
pub use room_member::*;
pub use room_usage::*;
pub use value_objects::*;
