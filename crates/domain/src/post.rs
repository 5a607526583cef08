use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{PostId, Timestamp, UserId};

/// 帖子可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostVisibility {
    Public,
    Private,
}

/// 用户帖子
///
/// 公开帖在发布 24 小时后由清扫任务转为私有（只影响 published_at 非空的行）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub visibility: PostVisibility,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Post {
    pub fn new(
        id: PostId,
        author_id: UserId,
        body: impl Into<String>,
        publish_now: bool,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(DomainError::invalid_argument("body", "cannot be empty"));
        }

        // 草稿在发布前保持私有，公开列表和可见性衰减只处理已发布的行
        let visibility = if publish_now {
            PostVisibility::Public
        } else {
            PostVisibility::Private
        };

        Ok(Self {
            id,
            author_id,
            body,
            visibility,
            published_at: publish_now.then_some(created_at),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_stays_private_with_no_published_at() {
        let post = Post::new(
            PostId::generate(),
            UserId::generate(),
            "draft",
            false,
            chrono::Utc::now(),
        )
        .unwrap();
        assert!(post.published_at.is_none());
        assert_eq!(post.visibility, PostVisibility::Private);
    }

    #[test]
    fn published_post_is_public_with_published_at() {
        let now = chrono::Utc::now();
        let post = Post::new(PostId::generate(), UserId::generate(), "hello", true, now).unwrap();
        assert_eq!(post.visibility, PostVisibility::Public);
        assert_eq!(post.published_at, Some(now));
    }
}
