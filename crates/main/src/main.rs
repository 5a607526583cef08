//! roomhub 服务入口
//!
//! 装配顺序：配置 → 数据库 → 仓库 → 扇出 → 服务 → 后台清扫 → HTTP/WS 路由。

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use application::{
    BcryptPasswordHasher, ChatMessageService, ChatMessageServiceDependencies, CleanupService,
    CleanupServiceDependencies, DirectMessageService, DirectMessageServiceDependencies,
    FanoutNotifier, MembershipGate, PostService, PostServiceDependencies, PresenceService,
    PresenceServiceDependencies, RoomService, RoomServiceDependencies, SystemClock, UploadService,
    UploadServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, CleanupSchedule, CleanupScheduler, FanoutPair, FsBlobStorage,
    LocalFanoutNotifier, PgChatMessageRepository, PgDirectMessageRepository, PgPostRepository,
    PgPresenceRepository, PgRoomMemberRepository, PgRoomRepository, PgRoomUsageRepository,
    RedisEventRelay, RedisFanoutNotifier,
};
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 生产入口用严格加载：缺少 DATABASE_URL / JWT_SECRET 直接失败
    let config = AppConfig::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "roomhub 启动中"
    );

    // 数据库连接池与迁移
    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;
    tracing::info!("数据库迁移完成");

    // 仓库
    let room_repository = Arc::new(PgRoomRepository::new(pg_pool.clone()));
    let member_repository = Arc::new(PgRoomMemberRepository::new(pg_pool.clone()));
    let chat_message_repository = Arc::new(PgChatMessageRepository::new(pg_pool.clone()));
    let direct_message_repository = Arc::new(PgDirectMessageRepository::new(pg_pool.clone()));
    let presence_repository = Arc::new(PgPresenceRepository::new(pg_pool.clone()));
    let post_repository = Arc::new(PgPostRepository::new(pg_pool.clone()));
    let usage_repository = Arc::new(PgRoomUsageRepository::new(pg_pool.clone()));

    let gate = Arc::new(MembershipGate::new(
        room_repository.clone(),
        member_repository.clone(),
    ));

    // 扇出：本地通道必开；配了 Redis 时发布走 Redis，
    // 订阅中转把所有实例的事件（含本实例）转投本地通道
    let local_fanout = LocalFanoutNotifier::new(config.broadcast.capacity);
    let remote_fanout = match &config.broadcast.redis_url {
        Some(url) => {
            let _relay = RedisEventRelay::new(url, local_fanout.clone())?.spawn();
            Some(Arc::new(RedisFanoutNotifier::connect(url).await?))
        }
        None => None,
    };
    let notifier: Arc<dyn FanoutNotifier> = Arc::new(FanoutPair::new(
        Arc::new(local_fanout.clone()),
        remote_fanout,
    ));

    let clock = Arc::new(SystemClock);
    let password_hasher = Arc::new(match config.server.bcrypt_cost {
        Some(cost) => BcryptPasswordHasher::new(cost),
        None => BcryptPasswordHasher::default(),
    });

    // 服务
    let room_service = Arc::new(RoomService::new(RoomServiceDependencies {
        room_repository: room_repository.clone(),
        member_repository: member_repository.clone(),
        usage_repository: usage_repository.clone(),
        password_hasher,
        clock: clock.clone(),
        rooms_per_month: config.quota.rooms_per_month,
    }));
    let chat_message_service = Arc::new(ChatMessageService::new(ChatMessageServiceDependencies {
        message_repository: chat_message_repository,
        gate: gate.clone(),
        notifier: notifier.clone(),
        clock: clock.clone(),
    }));
    let direct_message_service = Arc::new(DirectMessageService::new(
        DirectMessageServiceDependencies {
            message_repository: direct_message_repository,
            gate: gate.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        },
    ));
    let presence_service = Arc::new(PresenceService::new(PresenceServiceDependencies {
        presence_repository: presence_repository.clone(),
        gate: gate.clone(),
        notifier,
        clock: clock.clone(),
        online_window: chrono::Duration::seconds(config.presence.online_window_secs as i64),
    }));
    let post_service = Arc::new(PostService::new(PostServiceDependencies {
        post_repository: post_repository.clone(),
        clock: clock.clone(),
    }));
    let upload_service = Arc::new(UploadService::new(UploadServiceDependencies {
        storage: Arc::new(FsBlobStorage::new(
            config.storage.root.clone(),
            config.storage.public_base_url.clone(),
        )),
        clock: clock.clone(),
    }));

    // 周期清扫
    let cleanup_service = Arc::new(CleanupService::new(CleanupServiceDependencies {
        presence_repository,
        usage_repository,
        post_repository,
        clock,
        presence_sweep_ttl: chrono::Duration::seconds(config.presence.sweep_ttl_secs as i64),
        usage_retention: chrono::Duration::days(config.cleanup.usage_retention_days as i64),
        post_decay: chrono::Duration::hours(config.cleanup.post_decay_hours as i64),
    }));
    let _cleanup_tasks = CleanupScheduler::new(
        cleanup_service,
        CleanupSchedule {
            presence_sweep_interval: std::time::Duration::from_secs(
                config.presence.sweep_interval_secs,
            ),
            usage_prune_interval: std::time::Duration::from_secs(
                config.cleanup.usage_prune_interval_secs,
            ),
            post_decay_interval: std::time::Duration::from_secs(
                config.cleanup.post_decay_interval_secs,
            ),
        },
    )
    .spawn();

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState {
        room_service,
        chat_message_service,
        direct_message_service,
        presence_service,
        post_service,
        upload_service,
        gate,
        fanout: local_fanout,
        jwt_service,
    };

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "roomhub 已就绪");
    axum::serve(listener, app).await?;

    Ok(())
}
