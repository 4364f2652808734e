use std::collections::HashSet;

use async_trait::async_trait;

use super::TrackingEvent;
use crate::errors::Result;

/// 访问记录落库 Sink
#[async_trait]
pub trait PageViewSink: Send + Sync {
    /// 同步写入单条记录（降级路径）
    ///
    /// 先确认项目存在，不存在时返回 `NotFound` 且不写入任何数据。
    async fn insert_page_view(&self, event: TrackingEvent) -> Result<()>;

    /// 在同一事务内批量写入（批处理路径）
    ///
    /// 按 id 直接引用项目，不做存在性检查；任何一条失败则整批回滚。
    async fn insert_page_views(&self, events: Vec<TrackingEvent>) -> Result<()>;

    /// 返回 `ids` 中实际存在的项目 id（一次查询）
    async fn existing_project_ids(&self, ids: &[i64]) -> Result<HashSet<i64>>;
}
