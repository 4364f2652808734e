//! 访问记录入口
//!
//! 正常情况下只把事件压入缓冲区，由后台批处理落库；缓冲区不可用时
//! 同步写入数据库，保证不丢数据。

use std::sync::Arc;

use tracing::{trace, warn};

use super::{EventBuffer, PageViewSink, TrackingEvent};
use crate::errors::Result;

/// 一次访问上报的输入
#[derive(Debug, Clone, Default)]
pub struct TrackRequest {
    pub project_id: i64,
    pub channel: String,
    pub post_number: Option<String>,
    pub visitor_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// 写入缓冲区的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferOutcome {
    Buffered,
    Unavailable(String),
}

/// 一次上报最终写到了哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Buffered,
    StoredDirectly,
}

pub struct TrackingService {
    buffer: Arc<dyn EventBuffer>,
    sink: Arc<dyn PageViewSink>,
    key: String,
}

impl TrackingService {
    pub fn new(buffer: Arc<dyn EventBuffer>, sink: Arc<dyn PageViewSink>, key: String) -> Self {
        Self { buffer, sink, key }
    }

    /// 记录一次页面访问
    ///
    /// 每次调用只尝试一个目的地：缓冲区成功即返回；否则同步落库一次，
    /// 落库失败（包括项目不存在）直接返回给调用方，不重试。
    pub async fn record(&self, request: TrackRequest) -> Result<RecordOutcome> {
        let event = TrackingEvent::new(request.project_id, request.channel)
            .with_post_number(request.post_number)
            .with_visitor_id(request.visitor_id)
            .with_client(request.ip_address, request.user_agent);

        match self.try_buffer(&event).await {
            BufferOutcome::Buffered => {
                trace!(
                    "Page view buffered: project={}, channel={}",
                    event.project_id, event.channel
                );
                Ok(RecordOutcome::Buffered)
            }
            BufferOutcome::Unavailable(reason) => {
                warn!(
                    "Tracking buffer unavailable ({}), writing page view for project {} directly",
                    reason, event.project_id
                );
                self.sink.insert_page_view(event).await?;
                Ok(RecordOutcome::StoredDirectly)
            }
        }
    }

    async fn try_buffer(&self, event: &TrackingEvent) -> BufferOutcome {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => return BufferOutcome::Unavailable(e.to_string()),
        };

        match self.buffer.push_head(&self.key, payload).await {
            Ok(()) => BufferOutcome::Buffered,
            Err(e) => BufferOutcome::Unavailable(e.to_string()),
        }
    }

    pub fn buffer(&self) -> &Arc<dyn EventBuffer> {
        &self.buffer
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
