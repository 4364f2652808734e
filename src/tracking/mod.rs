pub mod buffer;
pub mod drain;
pub mod global;
pub mod service;
pub mod sink;
pub mod worker;

pub use buffer::{EventBuffer, MemoryEventBuffer, RedisEventBuffer};
pub use drain::{DrainProcessor, DrainReport};
pub use service::{BufferOutcome, RecordOutcome, TrackRequest, TrackingService};
pub use sink::PageViewSink;
pub use worker::{DrainHandle, DrainWorker};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// User-Agent 最大保存长度（与 page_views.user_agent 列宽一致）
pub const MAX_USER_AGENT_LEN: usize = 500;

/// 待落库的访问记录
///
/// 以 JSON（camelCase）形式存放在缓冲区中，`createdAt` 为采集时间，
/// 经过缓冲区后原样保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub project_id: i64,
    pub channel: String,
    #[serde(default)]
    pub post_number: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// 创建新的访问记录，时间戳为当前时间
    pub fn new(project_id: i64, channel: impl Into<String>) -> Self {
        Self {
            project_id,
            channel: channel.into(),
            post_number: None,
            visitor_id: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_post_number(mut self, post_number: Option<String>) -> Self {
        self.post_number = post_number;
        self
    }

    pub fn with_visitor_id(mut self, visitor_id: Option<String>) -> Self {
        self.visitor_id = visitor_id;
        self
    }

    /// 设置客户端信息，User-Agent 超长时截断
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent.map(|ua| truncate_chars(ua, MAX_USER_AGENT_LEN));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// 序列化为缓冲区载荷
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 从缓冲区载荷反序列化
    pub fn from_payload(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

fn truncate_chars(value: String, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_uses_camel_case() {
        let event = TrackingEvent::new(7, "thread")
            .with_post_number(Some("12".to_string()))
            .with_created_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());

        let payload = event.to_payload().unwrap();
        assert!(payload.contains("\"projectId\":7"));
        assert!(payload.contains("\"postNumber\":\"12\""));
        assert!(payload.contains("\"createdAt\":\"2024-03-01T09:30:00Z\""));
    }

    #[test]
    fn test_payload_preserves_created_at() {
        let created_at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let event = TrackingEvent::new(1, "instagram")
            .with_visitor_id(Some("v1".to_string()))
            .with_client(Some("10.0.0.1".to_string()), Some("curl/8".to_string()))
            .with_created_at(created_at);

        let parsed = TrackingEvent::from_payload(&event.to_payload().unwrap()).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_payload_missing_optional_fields() {
        let parsed =
            TrackingEvent::from_payload(r#"{"projectId":3,"channel":"direct"}"#).unwrap();
        assert_eq!(parsed.project_id, 3);
        assert_eq!(parsed.channel, "direct");
        assert!(parsed.visitor_id.is_none());
        assert!(parsed.post_number.is_none());
    }

    #[test]
    fn test_payload_missing_channel_is_malformed() {
        assert!(TrackingEvent::from_payload(r#"{"projectId":3}"#).is_err());
        assert!(TrackingEvent::from_payload("not json").is_err());
    }

    #[test]
    fn test_user_agent_truncated() {
        let long_ua = "a".repeat(MAX_USER_AGENT_LEN + 20);
        let event = TrackingEvent::new(1, "thread").with_client(None, Some(long_ua));
        assert_eq!(
            event.user_agent.map(|ua| ua.chars().count()),
            Some(MAX_USER_AGENT_LEN)
        );
    }
}
