//! 广播主题
//!
//! 主题按用途命名空间化：房间主题、个人主题，以及一小组无需鉴权的
//! 商品公共主题。私有主题的订阅鉴权在订阅时执行，而不只在发布时。

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::value_objects::{ProductId, RoomId, UserId};

/// 商品总览公共主题名
pub const STORE_PRODUCTS_TOPIC: &str = "store.products";

const ROOM_PREFIX: &str = "chat.room.";
const USER_PREFIX: &str = "user.";
const PRODUCT_PREFIX: &str = "product.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// 房间主题 `chat.room.{id}`，订阅需通过成员资格闸
    Room(RoomId),
    /// 个人主题 `user.{id}`，只有本人可订阅
    User(UserId),
    /// 商品主题 `product.{id}`，公共
    Product(ProductId),
    /// 商品总览主题 `store.products`，公共
    StoreProducts,
}

impl Topic {
    /// 公共主题订阅无需访问检查
    pub fn is_public(&self) -> bool {
        matches!(self, Topic::Product(_) | Topic::StoreProducts)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Room(id) => write!(f, "{ROOM_PREFIX}{id}"),
            Topic::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Topic::Product(id) => write!(f, "{PRODUCT_PREFIX}{id}"),
            Topic::StoreProducts => f.write_str(STORE_PRODUCTS_TOPIC),
        }
    }
}

impl FromStr for Topic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == STORE_PRODUCTS_TOPIC {
            return Ok(Topic::StoreProducts);
        }
        if let Some(id) = s.strip_prefix(ROOM_PREFIX) {
            return Uuid::parse_str(id).map(|u| Topic::Room(u.into())).map_err(|_| ());
        }
        if let Some(id) = s.strip_prefix(USER_PREFIX) {
            return Uuid::parse_str(id).map(|u| Topic::User(u.into())).map_err(|_| ());
        }
        if let Some(id) = s.strip_prefix(PRODUCT_PREFIX) {
            return Uuid::parse_str(id).map(|u| Topic::Product(u.into())).map_err(|_| ());
        }
        Err(())
    }
}
