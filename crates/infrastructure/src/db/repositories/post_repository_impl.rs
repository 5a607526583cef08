//! 帖子仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use application::{PostRepository, RepoResult, RepositoryError};
use domain::{Post, PostId, PostVisibility, Timestamp, UserId};

use super::{map_sqlx, unknown_value};
use crate::db::DbPool;

fn visibility_to_str(visibility: PostVisibility) -> &'static str {
    match visibility {
        PostVisibility::Public => "public",
        PostVisibility::Private => "private",
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbPost {
    id: Uuid,
    author_id: Uuid,
    body: String,
    visibility: String,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbPost> for Post {
    type Error = RepositoryError;

    fn try_from(row: DbPost) -> Result<Self, Self::Error> {
        let visibility = match row.visibility.as_str() {
            "public" => PostVisibility::Public,
            "private" => PostVisibility::Private,
            other => return Err(unknown_value("post visibility", other)),
        };

        Ok(Post {
            id: PostId::new(row.id),
            author_id: UserId::new(row.author_id),
            body: row.body,
            visibility,
            published_at: row.published_at,
            created_at: row.created_at,
        })
    }
}

pub struct PgPostRepository {
    pool: DbPool,
}

impl PgPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: &Post) -> RepoResult<()> {
        query(
            r#"
            INSERT INTO posts (id, author_id, body, visibility, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(Uuid::from(post.author_id))
        .bind(&post.body)
        .bind(visibility_to_str(post.visibility))
        .bind(post.published_at)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_public(&self, limit: u32) -> RepoResult<Vec<Post>> {
        let rows = query_as::<_, DbPost>(
            r#"
            SELECT id, author_id, body, visibility, published_at, created_at
            FROM posts
            WHERE visibility = 'public'
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn demote_published_before(&self, cutoff: Timestamp) -> RepoResult<u64> {
        // 只触碰已发布的公开帖，未发布的草稿永不衰减
        let result = query(
            r#"
            UPDATE posts
            SET visibility = 'private'
            WHERE visibility = 'public'
              AND published_at IS NOT NULL
              AND published_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }
}
