//! 缓冲区批量落库
//!
//! 每次运行包含若干轮：从列表尾部读取最多 `batch_size` 条（不删除），
//! 解析后在一个事务里写入，成功后按读取数量从尾部裁剪。
//! 解析失败或引用了不存在项目的条目被丢弃，但仍计入裁剪数量；
//! 写库失败则本轮不裁剪并结束运行。

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{EventBuffer, PageViewSink, TrackingEvent};
use crate::errors::Result;

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// 执行的轮数（含最后一次空读）
    pub cycles: usize,
    /// 从缓冲区读取并裁剪的条目数
    pub read: usize,
    /// 成功写入的记录数
    pub stored: usize,
    /// 无法解析或项目不存在而丢弃的条目数
    pub dropped: usize,
}

pub struct DrainProcessor {
    buffer: Arc<dyn EventBuffer>,
    sink: Arc<dyn PageViewSink>,
    key: String,
    batch_size: usize,
}

impl DrainProcessor {
    pub fn new(
        buffer: Arc<dyn EventBuffer>,
        sink: Arc<dyn PageViewSink>,
        key: String,
        batch_size: usize,
    ) -> Self {
        Self {
            buffer,
            sink,
            key,
            batch_size: batch_size.max(1),
        }
    }

    /// 执行一次完整运行，直到缓冲区读空或读到不足一批
    pub async fn run(&self) -> Result<DrainReport> {
        let mut report = DrainReport::default();

        loop {
            report.cycles += 1;
            let read = self.run_cycle(&mut report).await?;
            if read < self.batch_size {
                break;
            }
        }

        if report.read > 0 {
            info!(
                "Flushed {} page views from '{}' ({} dropped, {} cycles)",
                report.stored, self.key, report.dropped, report.cycles
            );
        }
        Ok(report)
    }

    /// 单轮处理，返回读取的条目数
    async fn run_cycle(&self, report: &mut DrainReport) -> Result<usize> {
        let batch = self.batch_size as isize;
        let items = self.buffer.range(&self.key, -batch, -1).await?;
        if items.is_empty() {
            return Ok(0);
        }

        let read = items.len();
        // 列表尾部是最早的事件，反转后按时间先后写入
        let mut events = Vec::with_capacity(read);
        for item in items.iter().rev() {
            match TrackingEvent::from_payload(item) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("Dropping malformed tracking payload: {} ({})", item, e);
                    report.dropped += 1;
                }
            }
        }

        let events = self.drop_orphans(events, report).await?;

        let stored = events.len();
        if stored > 0 {
            self.sink.insert_page_views(events).await?;
        }

        // 只裁掉本轮读取的条目，期间新压入头部的事件不受影响
        self.buffer
            .trim(&self.key, 0, -(read as isize + 1))
            .await?;

        report.read += read;
        report.stored += stored;
        debug!(
            "Drain cycle on '{}': read={}, stored={}",
            self.key, read, stored
        );
        Ok(read)
    }

    /// 过滤掉引用不存在项目的事件，避免外键失败卡住整批
    async fn drop_orphans(
        &self,
        events: Vec<TrackingEvent>,
        report: &mut DrainReport,
    ) -> Result<Vec<TrackingEvent>> {
        if events.is_empty() {
            return Ok(events);
        }

        let ids: Vec<i64> = events
            .iter()
            .map(|e| e.project_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known = self.sink.existing_project_ids(&ids).await?;
        if known.len() == ids.len() {
            return Ok(events);
        }

        let (kept, orphans): (Vec<_>, Vec<_>) = events
            .into_iter()
            .partition(|e| known.contains(&e.project_id));
        let missing: BTreeSet<i64> = orphans.iter().map(|e| e.project_id).collect();
        warn!(
            "Dropping {} page views for unknown projects {:?}",
            orphans.len(),
            missing
        );
        report.dropped += orphans.len();
        Ok(kept)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UxlogError;
    use crate::tracking::MemoryEventBuffer;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    const KEY: &str = "tracking:buffer";

    struct MockSink {
        batches: parking_lot::Mutex<Vec<Vec<TrackingEvent>>>,
        fail: AtomicBool,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                batches: parking_lot::Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        fn stored(&self) -> Vec<TrackingEvent> {
            self.batches.lock().iter().flatten().cloned().collect()
        }
    }

    #[async_trait]
    impl PageViewSink for MockSink {
        async fn insert_page_view(&self, event: TrackingEvent) -> Result<()> {
            self.batches.lock().push(vec![event]);
            Ok(())
        }

        async fn insert_page_views(&self, events: Vec<TrackingEvent>) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(UxlogError::database_operation("disk full"));
            }
            self.batches.lock().push(events);
            Ok(())
        }

        async fn existing_project_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
            Ok(ids.iter().copied().filter(|id| *id == 1).collect())
        }
    }

    fn event(n: i64) -> TrackingEvent {
        TrackingEvent::new(1, "thread")
            .with_post_number(Some(n.to_string()))
            .with_created_at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, n as u32).unwrap())
    }

    async fn push(buffer: &MemoryEventBuffer, payload: String) {
        buffer.push_head(KEY, payload).await.unwrap();
    }

    fn processor(
        buffer: &Arc<MemoryEventBuffer>,
        sink: &Arc<MockSink>,
        batch_size: usize,
    ) -> DrainProcessor {
        DrainProcessor::new(buffer.clone(), sink.clone(), KEY.to_string(), batch_size)
    }

    #[tokio::test]
    async fn test_single_event_drained() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        push(&buffer, event(1).to_payload().unwrap()).await;

        let report = processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(report.read, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(sink.stored(), vec![event(1)]);
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_dropped_but_trimmed() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        push(&buffer, event(1).to_payload().unwrap()).await;
        push(&buffer, "{not json".to_string()).await;
        push(&buffer, event(2).to_payload().unwrap()).await;
        push(&buffer, event(3).to_payload().unwrap()).await;

        let report = processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(report.read, 4);
        assert_eq!(report.stored, 3);
        assert_eq!(report.dropped, 1);
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_project_dropped_without_blocking_batch() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        push(&buffer, event(1).to_payload().unwrap()).await;
        push(&buffer, TrackingEvent::new(404, "thread").to_payload().unwrap()).await;
        push(&buffer, event(2).to_payload().unwrap()).await;

        let report = processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(report.read, 3);
        assert_eq!(report.stored, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(sink.stored(), vec![event(1), event(2)]);
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oldest_first_within_batch() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        for n in 1..=3 {
            push(&buffer, event(n).to_payload().unwrap()).await;
        }

        processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(sink.stored(), vec![event(1), event(2), event(3)]);
    }

    #[tokio::test]
    async fn test_multiple_cycles_drain_everything() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        for n in 0..250 {
            push(&buffer, event(n % 60).to_payload().unwrap()).await;
        }

        let report = processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(report.cycles, 3);
        assert_eq!(report.stored, 250);
        assert_eq!(sink.batches.lock().len(), 3);
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_batch_needs_extra_empty_read() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        for n in 0..10 {
            push(&buffer, event(n).to_payload().unwrap()).await;
        }

        let report = processor(&buffer, &sink, 5).run().await.unwrap();

        assert_eq!(report.cycles, 3);
        assert_eq!(report.stored, 10);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_buffer_untouched() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        sink.fail.store(true, Ordering::SeqCst);
        for n in 0..3 {
            push(&buffer, event(n).to_payload().unwrap()).await;
        }

        let result = processor(&buffer, &sink, 100).run().await;

        assert!(result.is_err());
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 3);

        // 下一次运行恢复正常
        sink.fail.store(false, Ordering::SeqCst);
        let report = processor(&buffer, &sink, 100).run().await.unwrap();
        assert_eq!(report.stored, 3);
        assert_eq!(buffer.backlog(KEY).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_events_pushed_mid_run_are_kept() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());
        for n in 0..3 {
            push(&buffer, event(n).to_payload().unwrap()).await;
        }

        // 模拟读取之后、裁剪之前有新事件写入头部
        let items = buffer.range(KEY, -100, -1).await.unwrap();
        push(&buffer, event(9).to_payload().unwrap()).await;
        buffer
            .trim(KEY, 0, -(items.len() as isize + 1))
            .await
            .unwrap();

        let rest = buffer.range(KEY, 0, -1).await.unwrap();
        assert_eq!(rest, vec![event(9).to_payload().unwrap()]);
        assert!(sink.stored().is_empty());
    }

    #[tokio::test]
    async fn test_empty_buffer_is_noop() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sink = Arc::new(MockSink::new());

        let report = processor(&buffer, &sink, 100).run().await.unwrap();

        assert_eq!(report, DrainReport { cycles: 1, ..Default::default() });
        assert!(sink.batches.lock().is_empty());
    }
}
