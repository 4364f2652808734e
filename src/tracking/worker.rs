//! 批量落库后台任务
//!
//! 所有运行都在同一个任务中串行执行：定时触发和手动触发共用一条通道，
//! 手动触发通过 oneshot 拿到本次运行的结果。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, trace, warn};

use super::{DrainProcessor, DrainReport};
use crate::errors::{Result, UxlogError};

type FlushReply = oneshot::Sender<Result<DrainReport>>;

/// 手动触发队列长度，超出时调用方等待
const FLUSH_QUEUE_SIZE: usize = 8;

pub struct DrainWorker {
    processor: Arc<DrainProcessor>,
    interval: Duration,
    requests: mpsc::Receiver<FlushReply>,
}

/// 后台任务的句柄，可克隆
#[derive(Clone)]
pub struct DrainHandle {
    sender: mpsc::Sender<FlushReply>,
}

impl DrainWorker {
    pub fn new(processor: Arc<DrainProcessor>, interval: Duration) -> (Self, DrainHandle) {
        let (sender, requests) = mpsc::channel(FLUSH_QUEUE_SIZE);
        let worker = Self {
            processor,
            // tokio interval 不接受零周期
            interval: interval.max(Duration::from_millis(1)),
            requests,
        };
        (worker, DrainHandle { sender })
    }

    /// 运行直到所有句柄被丢弃
    pub async fn run(mut self) {
        let mut ticker = interval(self.interval);
        // 固定间隔：一次运行超时后从完成时刻重新计时
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即完成，跳过以免启动时抢占
        ticker.tick().await;

        info!(
            "Drain worker started: key='{}', batch_size={}, interval={:?}",
            self.processor.key(),
            self.processor.batch_size(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    trace!("DrainWorker: scheduled run");
                    match self.processor.run().await {
                        Ok(_) => {}
                        // 缓冲区 / 数据库暂时不可用，下个周期重试
                        Err(e) if e.is_transient() => {
                            warn!("Scheduled drain run skipped: {}", e);
                        }
                        Err(e) => error!("Scheduled drain run aborted: {}", e),
                    }
                }
                request = self.requests.recv() => {
                    let Some(reply) = request else {
                        break;
                    };
                    debug!("DrainWorker: manual flush requested");
                    let result = self.processor.run().await;
                    if let Err(e) = &result {
                        error!("Manual drain run aborted: {}", e);
                    }
                    // 调用方可能已放弃等待
                    let _ = reply.send(result);
                }
            }
        }

        info!("Drain worker stopped");
    }
}

impl DrainHandle {
    /// 请求立即执行一次运行并等待结果
    pub async fn flush(&self) -> Result<DrainReport> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(reply)
            .await
            .map_err(|_| UxlogError::worker_stopped("Drain worker is not running"))?;
        receiver
            .await
            .map_err(|_| UxlogError::worker_stopped("Drain worker exited before replying"))?
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}
