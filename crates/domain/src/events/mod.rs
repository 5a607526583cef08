pub mod chat_event;
pub mod topic;

pub use chat_event::*;
pub use topic::*;
