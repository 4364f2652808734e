use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::get_config;
use crate::services::{EmailService, ProjectService, StatisticsService};
use crate::storage::{SeaOrmStorage, StorageFactory};
use crate::tracking::buffer::create_buffer;
use crate::tracking::global::set_global_drain_handle;
use crate::tracking::{DrainHandle, DrainProcessor, DrainWorker, EventBuffer, TrackingService};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub buffer: Arc<dyn EventBuffer>,
    pub tracking_service: Arc<TrackingService>,
    pub statistics_service: Arc<StatisticsService>,
    pub project_service: Arc<ProjectService>,
    pub email_service: Arc<EmailService>,
    pub drain_handle: DrainHandle,
}

/// 打开数据库并连接缓冲区
///
/// 服务器模式和一次性 drain 模式共用。
pub async fn prepare_core() -> Result<(Arc<SeaOrmStorage>, Arc<dyn EventBuffer>)> {
    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.get_backend_name());

    let config = get_config();
    let buffer = create_buffer(&config.tracking)
        .await
        .context("Failed to initialize tracking buffer")?;

    Ok((storage, buffer))
}

/// 创建批处理器（按配置的 key 与批大小）
pub fn build_processor(
    storage: &Arc<SeaOrmStorage>,
    buffer: Arc<dyn EventBuffer>,
) -> Arc<DrainProcessor> {
    let config = get_config();
    Arc::new(DrainProcessor::new(
        buffer,
        storage.as_page_view_sink(),
        config.tracking.key.clone(),
        config.tracking.batch_size,
    ))
}

/// 准备服务器启动的上下文
/// 包括存储、缓冲区、业务服务和后台批处理任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let (storage, buffer) = prepare_core().await?;
    let config = get_config();

    let tracking_service = Arc::new(TrackingService::new(
        buffer.clone(),
        storage.as_page_view_sink(),
        config.tracking.key.clone(),
    ));
    let statistics_service = Arc::new(StatisticsService::new(storage.clone()));
    let project_service = Arc::new(ProjectService::new(storage.clone()));
    let email_service = Arc::new(EmailService::new(storage.clone()));

    // 后台批处理只有一个实例，定时触发与手动 flush 都经由同一任务执行
    let processor = build_processor(&storage, buffer.clone());
    let interval = Duration::from_millis(config.tracking.flush_interval_ms);
    let (worker, drain_handle) = DrainWorker::new(processor, interval);
    tokio::spawn(worker.run());
    set_global_drain_handle(drain_handle.clone());
    debug!(
        "Drain worker started: key={}, batch_size={}, interval={}ms",
        config.tracking.key, config.tracking.batch_size, config.tracking.flush_interval_ms
    );

    if config.tracking.buffer_type == "memory" {
        warn!(
            "Tracking buffer type is 'memory': buffered events are lost on crash. \
             Use 'redis' for multi-instance or durable deployments."
        );
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        buffer,
        tracking_service,
        statistics_service,
        project_service,
        email_service,
        drain_handle,
    })
}
