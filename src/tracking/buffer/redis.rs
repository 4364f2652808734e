use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::EventBuffer;
use crate::errors::{Result, UxlogError};

/// 基于 Redis 列表的缓冲区
pub struct RedisEventBuffer {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    /// 单次命令（含建连）超时
    op_timeout: Duration,
}

impl RedisEventBuffer {
    /// 创建缓冲区并尝试建立连接
    ///
    /// Redis 暂时不可用不会导致启动失败：写入会走降级路径，连接在下次调用时重建。
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            UxlogError::validation(format!("Invalid Redis URL '{}': {}", url, e))
        })?;

        let buffer = Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            op_timeout,
        };

        match buffer.get_connection().await {
            Ok(_) => debug!("Redis tracking buffer connected: {}", url),
            Err(e) => warn!(
                "Redis tracking buffer is not reachable yet ({}), page views will be written directly until it recovers",
                e
            ),
        }

        Ok(buffer)
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = timeout(
            self.op_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await??;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// 在超时内执行命令，失败时重置连接
    async fn execute<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let conn = match self.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                self.reset_connection().await;
                return Err(e);
            }
        };

        match timeout(self.op_timeout, f(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Redis {} failed: {}", op, e);
                self.reset_connection().await;
                Err(e.into())
            }
            Err(_) => {
                warn!("Redis {} timed out after {:?}", op, self.op_timeout);
                self.reset_connection().await;
                Err(UxlogError::buffer_unavailable(format!(
                    "Redis {} timed out",
                    op
                )))
            }
        }
    }
}

#[async_trait]
impl EventBuffer for RedisEventBuffer {
    async fn push_head(&self, key: &str, payload: String) -> Result<()> {
        // 客户端超时不代表服务端未执行：LPUSH 可能已入队，调用方随后的直写会产生一条重复记录
        self.execute("LPUSH", |mut conn| async move {
            conn.lpush::<_, _, ()>(key, payload).await
        })
        .await?;
        trace!("RedisEventBuffer: LPUSH to '{}'", key);
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.execute("LRANGE", |mut conn| async move {
            conn.lrange::<_, Vec<String>>(key, start, stop).await
        })
        .await
    }

    async fn trim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        self.execute("LTRIM", |mut conn| async move {
            conn.ltrim::<_, ()>(key, start, stop).await
        })
        .await
    }

    async fn backlog(&self, key: &str) -> Result<usize> {
        self.execute("LLEN", |mut conn| async move {
            conn.llen::<_, usize>(key).await
        })
        .await
    }

    fn buffer_type(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_PREFIX: &str = "uxlog:test:buffer";

    fn test_key(name: &str) -> String {
        format!(
            "{}:{}:{}",
            KEY_PREFIX,
            name,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        )
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_unavailable() {
        let buffer = RedisEventBuffer::connect("redis://127.0.0.1:1", Duration::from_millis(200))
            .await
            .unwrap();

        assert!(buffer.push_head("k", "{}".to_string()).await.is_err());
        assert!(buffer.backlog("k").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let result = RedisEventBuffer::connect("not-a-url", Duration::from_millis(200)).await;
        assert!(matches!(result, Err(UxlogError::Validation(_))));
    }

    /// 需要可用的 Redis：UXLOG_TEST_REDIS_URL=redis://127.0.0.1:6379
    #[tokio::test]
    #[ignore]
    async fn test_push_range_trim_against_redis() {
        let url = std::env::var("UXLOG_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let buffer = RedisEventBuffer::connect(&url, Duration::from_secs(2))
            .await
            .unwrap();
        let key = test_key("drain");

        for n in 1..=5 {
            buffer.push_head(&key, format!("e{}", n)).await.unwrap();
        }
        assert_eq!(buffer.backlog(&key).await.unwrap(), 5);

        // 尾部最旧：取最旧的 3 条
        let items = buffer.range(&key, -3, -1).await.unwrap();
        assert_eq!(items, vec!["e3", "e2", "e1"]);

        // 读取期间新入队的事件在头部，按已读数量裁尾不会误删
        buffer.push_head(&key, "e6".to_string()).await.unwrap();
        buffer.trim(&key, 0, -4).await.unwrap();
        let rest = buffer.range(&key, 0, -1).await.unwrap();
        assert_eq!(rest, vec!["e6", "e5", "e4"]);

        buffer.trim(&key, 1, 0).await.unwrap();
        assert_eq!(buffer.backlog(&key).await.unwrap(), 0);
    }
}
