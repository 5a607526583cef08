use std::sync::Arc;

use uuid::Uuid;

use domain::{Post, PostId, UserId};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::repository::PostRepository;

#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub author_id: Uuid,
    pub body: String,
    /// true 时立即发布（published_at = now），公开帖从此刻起进入 24 小时可见性衰减
    pub publish_now: bool,
}

pub struct PostServiceDependencies {
    pub post_repository: Arc<dyn PostRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct PostService {
    deps: PostServiceDependencies,
}

impl PostService {
    pub fn new(deps: PostServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ApplicationError> {
        let post = Post::new(
            PostId::generate(),
            UserId::from(request.author_id),
            request.body,
            request.publish_now,
            self.deps.clock.now(),
        )?;

        self.deps.post_repository.create(&post).await?;
        tracing::debug!(post_id = %post.id, "帖子已创建");
        Ok(post)
    }

    pub async fn list_public_posts(&self, limit: u32) -> Result<Vec<Post>, ApplicationError> {
        let posts = self
            .deps
            .post_repository
            .list_public(limit.clamp(1, 100))
            .await?;
        Ok(posts)
    }
}
