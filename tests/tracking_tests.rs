//! 访问采集链路集成测试
//!
//! 缓冲区 -> 批处理 -> SQLite 的完整流程，以及缓冲区不可用时的直写降级。

use std::sync::{Arc, Once};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};
use tempfile::TempDir;

use migration::entities::page_view;
use uxlog::config::init_config;
use uxlog::errors::{Result, UxlogError};
use uxlog::storage::{NewProject, SeaOrmStorage};
use uxlog::tracking::{
    DrainProcessor, DrainReport, EventBuffer, MemoryEventBuffer, RecordOutcome, TrackRequest,
    TrackingEvent, TrackingService,
};

const KEY: &str = "tracking:buffer";

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn setup() -> (TempDir, Arc<SeaOrmStorage>) {
    init_static_config();
    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let db_path = temp_dir.path().join("tracking_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("创建存储失败"),
    );
    (temp_dir, storage)
}

async fn create_project(storage: &SeaOrmStorage) -> i64 {
    storage
        .create_project(NewProject {
            name: "waitlist".to_string(),
            ..Default::default()
        })
        .await
        .expect("创建项目失败")
        .id
}

async fn stored_rows(storage: &SeaOrmStorage) -> Vec<page_view::Model> {
    page_view::Entity::find()
        .all(storage.get_db())
        .await
        .expect("查询访问记录失败")
}

/// 总是失败的缓冲区，用于触发直写降级
struct DownBuffer;

#[async_trait]
impl EventBuffer for DownBuffer {
    async fn push_head(&self, _key: &str, _payload: String) -> Result<()> {
        Err(UxlogError::buffer_unavailable("connection refused"))
    }
    async fn range(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        Err(UxlogError::buffer_unavailable("connection refused"))
    }
    async fn trim(&self, _key: &str, _start: isize, _stop: isize) -> Result<()> {
        Err(UxlogError::buffer_unavailable("connection refused"))
    }
    async fn backlog(&self, _key: &str) -> Result<usize> {
        Err(UxlogError::buffer_unavailable("connection refused"))
    }
    fn buffer_type(&self) -> &'static str {
        "down"
    }
}

fn track_request(project_id: i64, channel: &str) -> TrackRequest {
    TrackRequest {
        project_id,
        channel: channel.to_string(),
        visitor_id: Some("v1".to_string()),
        ip_address: Some("203.0.113.9".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_single_event_drained_into_database() {
    let (_dir, storage) = setup().await;
    let project_id = create_project(&storage).await;
    let buffer = Arc::new(MemoryEventBuffer::new());

    let service = TrackingService::new(
        buffer.clone(),
        storage.as_page_view_sink(),
        KEY.to_string(),
    );
    let outcome = service.record(track_request(project_id, "thread")).await.unwrap();
    assert_eq!(outcome, RecordOutcome::Buffered);
    assert_eq!(buffer.backlog(KEY).await.unwrap(), 1);
    assert!(stored_rows(&storage).await.is_empty());

    let processor = DrainProcessor::new(buffer.clone(), storage.as_page_view_sink(), KEY.to_string(), 100);
    let report = processor.run().await.unwrap();

    assert_eq!(
        report,
        DrainReport {
            cycles: 1,
            read: 1,
            stored: 1,
            dropped: 0
        }
    );
    assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);

    let rows = stored_rows(&storage).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].project_id, project_id);
    assert_eq!(rows[0].channel, "thread");
    assert_eq!(rows[0].visitor_id.as_deref(), Some("v1"));
    assert_eq!(rows[0].ip_address.as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn test_drain_preserves_capture_time() {
    let (_dir, storage) = setup().await;
    let project_id = create_project(&storage).await;
    let buffer = Arc::new(MemoryEventBuffer::new());

    let captured_at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 15, 0).unwrap();
    let event = TrackingEvent::new(project_id, "instagram").with_created_at(captured_at);
    buffer.push_head(KEY, event.to_payload().unwrap()).await.unwrap();

    let processor = DrainProcessor::new(buffer.clone(), storage.as_page_view_sink(), KEY.to_string(), 100);
    processor.run().await.unwrap();

    let rows = stored_rows(&storage).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].created_at, captured_at);
}

#[tokio::test]
async fn test_drain_large_backlog_in_batches() {
    let (_dir, storage) = setup().await;
    let project_id = create_project(&storage).await;
    let buffer = Arc::new(MemoryEventBuffer::new());

    for i in 0..25 {
        let event = TrackingEvent::new(project_id, "thread")
            .with_visitor_id(Some(format!("v{}", i % 7)));
        buffer.push_head(KEY, event.to_payload().unwrap()).await.unwrap();
    }
    // 混入一条无法解析的记录
    buffer.push_head(KEY, "{broken".to_string()).await.unwrap();

    let processor = DrainProcessor::new(buffer.clone(), storage.as_page_view_sink(), KEY.to_string(), 10);
    let report = processor.run().await.unwrap();

    assert_eq!(report.cycles, 3);
    assert_eq!(report.read, 26);
    assert_eq!(report.stored, 25);
    assert_eq!(report.dropped, 1);
    assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);

    let count = page_view::Entity::find()
        .count(storage.get_db())
        .await
        .unwrap();
    assert_eq!(count, 25);
}

#[tokio::test]
async fn test_unknown_project_does_not_block_batch() {
    let (_dir, storage) = setup().await;
    let project_id = create_project(&storage).await;
    let buffer = Arc::new(MemoryEventBuffer::new());

    let orphan = TrackingEvent::new(9999, "thread");
    buffer.push_head(KEY, orphan.to_payload().unwrap()).await.unwrap();
    for n in 0..3 {
        let event = TrackingEvent::new(project_id, "thread").with_post_number(Some(n.to_string()));
        buffer.push_head(KEY, event.to_payload().unwrap()).await.unwrap();
    }

    let processor = DrainProcessor::new(buffer.clone(), storage.as_page_view_sink(), KEY.to_string(), 100);
    let report = processor.run().await.unwrap();

    assert_eq!(report.read, 4);
    assert_eq!(report.stored, 3);
    assert_eq!(report.dropped, 1);
    assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    let rows = stored_rows(&storage).await;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.project_id == project_id));
}

#[tokio::test]
async fn test_fallback_writes_directly_when_buffer_down() {
    let (_dir, storage) = setup().await;
    let project_id = create_project(&storage).await;

    let service = TrackingService::new(
        Arc::new(DownBuffer),
        storage.as_page_view_sink(),
        KEY.to_string(),
    );
    let outcome = service.record(track_request(project_id, "direct")).await.unwrap();

    assert_eq!(outcome, RecordOutcome::StoredDirectly);
    let rows = stored_rows(&storage).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].channel, "direct");
}

#[tokio::test]
async fn test_fallback_unknown_project_is_not_found() {
    let (_dir, storage) = setup().await;

    let service = TrackingService::new(
        Arc::new(DownBuffer),
        storage.as_page_view_sink(),
        KEY.to_string(),
    );
    let err = service.record(track_request(424242, "thread")).await.unwrap_err();

    assert!(matches!(err, UxlogError::NotFound(_)));
    assert!(stored_rows(&storage).await.is_empty());
}
