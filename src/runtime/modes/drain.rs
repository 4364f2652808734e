//! One-shot drain mode
//!
//! 不启动 HTTP 服务，直接把缓冲区中的积压全部落库后退出。
//! 与运行中的服务器同时执行时会出现并发批处理，只应在服务停止时使用。

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::runtime::lifetime::startup::{build_processor, prepare_core};
use crate::tracking::DrainReport;

pub async fn run_drain_once() -> Result<DrainReport> {
    let (storage, buffer) = prepare_core().await?;

    let backlog = buffer.backlog(&crate::config::get_config().tracking.key).await;
    match backlog {
        Ok(n) => info!("Draining {} buffered page views", n),
        Err(e) => warn!("Failed to read buffer backlog: {}", e),
    }

    let processor = build_processor(&storage, buffer);
    let report = processor
        .run()
        .await
        .context("Drain run failed, unprocessed events remain buffered")?;

    info!(
        "Drain completed: {} read, {} stored, {} dropped in {} cycles",
        report.read, report.stored, report.dropped, report.cycles
    );

    storage.close().await;
    Ok(report)
}
