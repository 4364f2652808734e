use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;
use crate::tracking::global::get_drain_handle;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

pub async fn listen_for_shutdown(storage: &SeaOrmStorage) {
    // 等待 Ctrl+C 信号
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, draining buffered page views...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(storage),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(storage: &SeaOrmStorage) {
    // 最后一次 drain；失败的批次留在缓冲区，下次启动继续处理
    if let Some(handle) = get_drain_handle() {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), handle.flush()).await {
            Ok(Ok(report)) => {
                info!(
                    "Final drain completed: {} stored, {} dropped in {} cycles",
                    report.stored, report.dropped, report.cycles
                );
            }
            Ok(Err(e)) => {
                error!("Final drain failed, events stay buffered: {}", e);
            }
            Err(_) => {
                error!("Final drain timed out after {} seconds", TASK_TIMEOUT_SECS);
            }
        }
    } else {
        info!("Drain worker is not initialized, skipping final drain");
    }

    storage.close().await;
}
