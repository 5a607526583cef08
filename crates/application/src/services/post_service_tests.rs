//! 帖子服务单元测试

use uuid::Uuid;

use domain::{DomainError, PostVisibility};

use crate::services::post_service::*;
use crate::services::test_support::*;

fn service(world: &TestWorld) -> PostService {
    PostService::new(PostServiceDependencies {
        post_repository: world.posts.clone(),
        clock: world.clock.clone(),
    })
}

#[tokio::test]
async fn drafts_never_appear_in_the_public_feed() {
    let world = TestWorld::new();
    let svc = service(&world);
    let author = Uuid::new_v4();

    let published = svc
        .create_post(CreatePostRequest {
            author_id: author,
            body: "published".to_owned(),
            publish_now: true,
        })
        .await
        .unwrap();
    assert_eq!(published.visibility, PostVisibility::Public);
    assert!(published.published_at.is_some());

    let draft = svc
        .create_post(CreatePostRequest {
            author_id: author,
            body: "draft".to_owned(),
            publish_now: false,
        })
        .await
        .unwrap();
    assert_eq!(draft.visibility, PostVisibility::Private);
    assert!(draft.published_at.is_none());

    let feed = svc.list_public_posts(10).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, published.id);
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let world = TestWorld::new();
    let result = service(&world)
        .create_post(CreatePostRequest {
            author_id: Uuid::new_v4(),
            body: "   ".to_owned(),
            publish_now: true,
        })
        .await;

    assert_domain_error(result, |err| {
        matches!(err, DomainError::InvalidArgument { field, .. } if field == "body")
    });
}
