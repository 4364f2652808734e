//! 访问事件缓冲区
//!
//! 缓冲区是一个有序列表：新事件压入头部，批量任务从尾部读取并按数量裁剪。
//! 下标语义与 Redis 列表一致（负数下标从尾部计数，`-1` 为最后一个元素）。

mod memory;
mod redis;

pub use self::memory::MemoryEventBuffer;
pub use self::redis::RedisEventBuffer;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::TrackingConfig;
use crate::errors::{Result, UxlogError};

#[async_trait]
pub trait EventBuffer: Send + Sync {
    /// 压入列表头部（LPUSH）
    async fn push_head(&self, key: &str, payload: String) -> Result<()>;

    /// 读取 `[start, stop]` 区间（LRANGE，不删除）
    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// 只保留 `[start, stop]` 区间（LTRIM）
    async fn trim(&self, key: &str, start: isize, stop: isize) -> Result<()>;

    /// 当前积压数量（LLEN）
    async fn backlog(&self, key: &str) -> Result<usize>;

    fn buffer_type(&self) -> &'static str;
}

/// 根据配置创建缓冲区
pub async fn create_buffer(config: &TrackingConfig) -> Result<Arc<dyn EventBuffer>> {
    let buffer: Arc<dyn EventBuffer> = match config.buffer_type.as_str() {
        "redis" => Arc::new(
            RedisEventBuffer::connect(
                &config.redis.url,
                Duration::from_millis(config.buffer_timeout_ms),
            )
            .await?,
        ),
        "memory" => Arc::new(MemoryEventBuffer::new()),
        other => {
            return Err(UxlogError::validation(format!(
                "Unknown tracking buffer type '{}'. Supported: redis, memory",
                other
            )));
        }
    };

    info!("Tracking buffer initialized: {}", buffer.buffer_type());
    Ok(buffer)
}

/// 将 Redis 风格的下标区间换算为 `[start, stop]` 闭区间，空区间返回 None
pub(crate) fn normalize_range(start: isize, stop: isize, len: usize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
