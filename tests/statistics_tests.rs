//! 统计报表集成测试（SQLite）

use std::sync::{Arc, Once};

use chrono::{Duration, Utc};
use tempfile::TempDir;

use uxlog::config::init_config;
use uxlog::errors::UxlogError;
use uxlog::services::StatisticsService;
use uxlog::storage::{NewProject, SeaOrmStorage};
use uxlog::tracking::{PageViewSink, TrackingEvent};

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

struct TestEnv {
    _dir: TempDir,
    storage: Arc<SeaOrmStorage>,
    service: StatisticsService,
    project_id: i64,
}

async fn setup() -> TestEnv {
    init_static_config();
    let dir = TempDir::new().expect("创建临时目录失败");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("stats.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("创建存储失败"),
    );
    let project_id = storage
        .create_project(NewProject {
            name: "launch".to_string(),
            ..Default::default()
        })
        .await
        .expect("创建项目失败")
        .id;
    let service = StatisticsService::new(storage.clone());
    TestEnv {
        _dir: dir,
        storage,
        service,
        project_id,
    }
}

fn view(project_id: i64, channel: &str, visitor: &str) -> TrackingEvent {
    TrackingEvent::new(project_id, channel).with_visitor_id(Some(visitor.to_string()))
}

async fn store(env: &TestEnv, events: Vec<TrackingEvent>) {
    env.storage
        .insert_page_views(events)
        .await
        .expect("写入访问记录失败");
}

async fn subscribe(env: &TestEnv, email: &str, channel: Option<&str>, post: Option<&str>) {
    env.storage
        .insert_email(
            env.project_id,
            email,
            channel.map(str::to_string),
            post.map(str::to_string),
        )
        .await
        .expect("写入订阅失败");
}

/// thread×3 (v1,v1,v2) + instagram×2 (v1,v3)，订阅 thread×1 + instagram×1
async fn seed_channels(env: &TestEnv) {
    let p = env.project_id;
    store(
        env,
        vec![
            view(p, "thread", "v1"),
            view(p, "thread", "v1"),
            view(p, "thread", "v2"),
            view(p, "instagram", "v1"),
            view(p, "instagram", "v3"),
        ],
    )
    .await;
    subscribe(env, "a@example.com", Some("thread"), None).await;
    subscribe(env, "b@example.com", Some("instagram"), None).await;
}

#[tokio::test]
async fn test_project_summary() {
    let env = setup().await;
    seed_channels(&env).await;

    let stats = env.service.get_project_statistics(env.project_id).await.unwrap();

    assert_eq!(stats.project_name, "launch");
    assert_eq!(stats.total_page_views, 5);
    assert_eq!(stats.total_unique_visitors, 3);
    assert_eq!(stats.total_emails, 2);
    assert!((stats.conversion_rate - 66.67).abs() < 0.01);

    assert_eq!(stats.channel_stats.len(), 2);
    let thread = &stats.channel_stats[0];
    assert_eq!(thread.channel, "thread");
    assert_eq!(thread.page_views, 3);
    assert_eq!(thread.unique_visitors, 2);
    assert_eq!(thread.emails, 1);
    assert!((thread.conversion_rate - 50.0).abs() < f64::EPSILON);

    let instagram = &stats.channel_stats[1];
    assert_eq!(instagram.channel, "instagram");
    assert_eq!(instagram.page_views, 2);
    assert_eq!(instagram.unique_visitors, 2);
}

#[tokio::test]
async fn test_channel_with_only_emails_is_reported() {
    let env = setup().await;
    seed_channels(&env).await;
    // 未标注渠道的订阅归入 direct
    subscribe(&env, "c@example.com", None, None).await;

    let stats = env.service.get_project_statistics(env.project_id).await.unwrap();

    let direct = stats
        .channel_stats
        .iter()
        .find(|c| c.channel == "direct")
        .expect("direct 渠道缺失");
    assert_eq!(direct.page_views, 0);
    assert_eq!(direct.emails, 1);
    assert_eq!(direct.conversion_rate, 0.0);
    assert_eq!(stats.channel_stats.last().map(|c| c.channel.as_str()), Some("direct"));
    assert_eq!(stats.total_emails, 3);
}

#[tokio::test]
async fn test_visitors_without_id_fall_back_to_ip_and_agent() {
    let env = setup().await;
    let p = env.project_id;
    let anonymous = |ip: &str| {
        TrackingEvent::new(p, "thread").with_client(Some(ip.to_string()), Some("UA".to_string()))
    };
    store(
        &env,
        vec![anonymous("10.0.0.1"), anonymous("10.0.0.1"), anonymous("10.0.0.2")],
    )
    .await;

    let stats = env.service.get_project_statistics(p).await.unwrap();
    assert_eq!(stats.total_page_views, 3);
    assert_eq!(stats.total_unique_visitors, 2);
}

#[tokio::test]
async fn test_empty_project_has_zero_rate() {
    let env = setup().await;

    let stats = env.service.get_project_statistics(env.project_id).await.unwrap();

    assert_eq!(stats.total_page_views, 0);
    assert_eq!(stats.total_unique_visitors, 0);
    assert_eq!(stats.conversion_rate, 0.0);
    assert!(stats.channel_stats.is_empty());
}

#[tokio::test]
async fn test_summary_unknown_project() {
    let env = setup().await;

    let err = env.service.get_project_statistics(777).await.unwrap_err();
    assert!(matches!(err, UxlogError::NotFound(_)));
}

#[tokio::test]
async fn test_daily_statistics_window() {
    let env = setup().await;
    let p = env.project_id;
    let now = Utc::now();
    store(
        &env,
        vec![
            view(p, "thread", "v1"),
            view(p, "thread", "v2"),
            view(p, "thread", "v1").with_created_at(now - Duration::days(2)),
            view(p, "thread", "v9").with_created_at(now - Duration::days(40)),
        ],
    )
    .await;
    subscribe(&env, "a@example.com", Some("thread"), None).await;

    let daily = env.service.get_daily_statistics(p, 30).await.unwrap();

    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].date, now.date_naive());
    assert_eq!(daily[0].page_views, 2);
    assert_eq!(daily[0].unique_visitors, 2);
    assert_eq!(daily[0].emails, 1);
    assert!((daily[0].conversion_rate - 50.0).abs() < f64::EPSILON);
    assert_eq!(daily[1].date, (now - Duration::days(2)).date_naive());
    assert_eq!(daily[1].page_views, 1);
    assert_eq!(daily[1].emails, 0);
}

#[tokio::test]
async fn test_daily_window_out_of_range_is_rejected() {
    let env = setup().await;
    let p = env.project_id;

    let err = env
        .service
        .get_daily_statistics(p, u32::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, UxlogError::Validation(_)));

    let err = env
        .service
        .get_post_daily_statistics(p, "1", u32::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, UxlogError::Validation(_)));

    let err = env
        .service
        .get_daily_post_statistics(p, u32::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, UxlogError::Validation(_)));
}

#[tokio::test]
async fn test_post_statistics_skip_missing_post_number() {
    let env = setup().await;
    let p = env.project_id;
    let post = |n: &str, v: &str| view(p, "thread", v).with_post_number(Some(n.to_string()));
    store(
        &env,
        vec![
            post("12", "v1"),
            post("12", "v2"),
            post("12", "v2"),
            post("7", "v3"),
            view(p, "thread", "v4"),
        ],
    )
    .await;
    subscribe(&env, "a@example.com", Some("thread"), Some("12")).await;
    subscribe(&env, "b@example.com", Some("thread"), None).await;

    let posts = env.service.get_post_statistics(p).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].post_number, "12");
    assert_eq!(posts[0].page_views, 3);
    assert_eq!(posts[0].unique_visitors, 2);
    assert_eq!(posts[0].emails, 1);
    assert_eq!(posts[1].post_number, "7");
    assert_eq!(posts[1].emails, 0);
}

#[tokio::test]
async fn test_daily_post_statistics_order() {
    let env = setup().await;
    let p = env.project_id;
    let now = Utc::now();
    let post = |n: &str, v: &str| view(p, "thread", v).with_post_number(Some(n.to_string()));
    store(
        &env,
        vec![
            post("1", "v1"),
            post("2", "v1"),
            post("2", "v2"),
            post("1", "v3").with_created_at(now - Duration::days(1)),
        ],
    )
    .await;

    let rows = env.service.get_daily_post_statistics(p, 7).await.unwrap();

    let keys: Vec<(chrono::NaiveDate, &str, u64)> = rows
        .iter()
        .map(|r| (r.date, r.post_number.as_str(), r.page_views))
        .collect();
    assert_eq!(
        keys,
        vec![
            (now.date_naive(), "2", 2),
            (now.date_naive(), "1", 1),
            ((now - Duration::days(1)).date_naive(), "1", 1),
        ]
    );
}

#[tokio::test]
async fn test_single_post_daily_statistics() {
    let env = setup().await;
    let p = env.project_id;
    let post = |n: &str, v: &str| view(p, "thread", v).with_post_number(Some(n.to_string()));
    store(&env, vec![post("5", "v1"), post("5", "v2"), post("6", "v3")]).await;
    subscribe(&env, "a@example.com", Some("thread"), Some("5")).await;
    subscribe(&env, "b@example.com", Some("thread"), Some("6")).await;

    let daily = env.service.get_post_daily_statistics(p, "5", 30).await.unwrap();

    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].page_views, 2);
    assert_eq!(daily[0].unique_visitors, 2);
    assert_eq!(daily[0].emails, 1);
}

#[tokio::test]
async fn test_detailed_statistics() {
    let env = setup().await;
    seed_channels(&env).await;

    let detailed = env.service.get_detailed_statistics(env.project_id, 30).await.unwrap();

    assert_eq!(detailed.summary.total_page_views, 5);
    assert_eq!(detailed.daily_stats.len(), 1);
    assert_eq!(detailed.daily_stats[0].page_views, 5);
    assert!(detailed.post_stats.is_empty());
}
