//! 周期清扫任务单元测试

use chrono::Duration;

use domain::{OnlineMember, Post, PostId, RoomId, RoomUsage, UserId};

use crate::clock::Clock;
use crate::repository::{PostRepository, PresenceRepository, RoomUsageRepository};
use crate::services::cleanup_service::*;
use crate::services::test_support::*;

fn service(world: &TestWorld) -> CleanupService {
    CleanupService::new(CleanupServiceDependencies {
        presence_repository: world.presence.clone(),
        usage_repository: world.usage.clone(),
        post_repository: world.posts.clone(),
        clock: world.clock.clone(),
        presence_sweep_ttl: Duration::minutes(8),
        usage_retention: Duration::days(90),
        post_decay: Duration::hours(24),
    })
}

#[tokio::test]
async fn sweep_deletes_only_rows_older_than_the_ttl() {
    let world = TestWorld::new();
    let room_id = RoomId::generate();
    let stale = UserId::generate();
    let fresh = UserId::generate();
    let now = world.clock.now();

    // 10 分钟前的行过了 8 分钟 TTL，3 分钟前的行还没到
    world
        .presence
        .upsert(OnlineMember::new(room_id, stale, now - Duration::minutes(10)))
        .await
        .unwrap();
    world
        .presence
        .upsert(OnlineMember::new(room_id, fresh, now - Duration::minutes(3)))
        .await
        .unwrap();

    let svc = service(&world);
    assert_eq!(svc.sweep_presence().await.unwrap(), 1);

    let remaining = world
        .presence
        .list_seen_since(room_id, now - Duration::minutes(8))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, fresh);

    // 幂等：再扫一遍没有可删的
    assert_eq!(svc.sweep_presence().await.unwrap(), 0);
}

#[tokio::test]
async fn post_decay_demotes_day_old_public_posts_only() {
    let world = TestWorld::new();
    let now = world.clock.now();
    let author = UserId::generate();

    let old_public = Post::new(
        PostId::generate(),
        author,
        "old",
        true,
        now - Duration::hours(25),
    )
    .unwrap();
    let recent_public = Post::new(
        PostId::generate(),
        author,
        "recent",
        true,
        now - Duration::hours(2),
    )
    .unwrap();
    // 未发布的帖子没有 published_at，永不衰减
    let draft = Post::new(PostId::generate(), author, "draft", false, now).unwrap();

    for post in [&old_public, &recent_public, &draft] {
        world.posts.create(post).await.unwrap();
    }

    let svc = service(&world);
    assert_eq!(svc.decay_post_visibility().await.unwrap(), 1);

    let visible = world.posts.list_public(10).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, recent_public.id);

    // 幂等：已转私有的不会再计数
    assert_eq!(svc.decay_post_visibility().await.unwrap(), 0);
}

#[tokio::test]
async fn usage_prune_drops_periods_past_the_retention_window() {
    let world = TestWorld::new();
    let user = UserId::generate();
    let now = world.clock.now();

    let (year, month) = RoomUsage::period_of(now);
    let (old_year, old_month) = RoomUsage::period_of(now - Duration::days(120));
    world.usage.increment(user, year, month).await.unwrap();
    world
        .usage
        .increment(user, old_year, old_month)
        .await
        .unwrap();

    let svc = service(&world);
    assert_eq!(svc.prune_room_usage().await.unwrap(), 1);

    // 当期计数保留，配额检查不受影响
    assert_eq!(
        world.usage.rooms_created_in(user, year, month).await.unwrap(),
        1
    );
    assert_eq!(
        world
            .usage
            .rooms_created_in(user, old_year, old_month)
            .await
            .unwrap(),
        0
    );
}
