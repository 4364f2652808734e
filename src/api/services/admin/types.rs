//! Admin API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use migration::entities::{email_subscription, project};

/// 统一响应包装
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// POST /api/admin/projects
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub waiting_offset: i64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub waiting_offset: i64,
    pub created_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            waiting_offset: model.waiting_offset,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailResponse {
    pub id: i64,
    pub email: String,
    pub channel: Option<String>,
    pub post_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<email_subscription::Model> for EmailResponse {
    fn from(model: email_subscription::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            channel: model.channel,
            post_number: model.post_number,
            created_at: model.created_at,
        }
    }
}

/// 按天统计的查询参数
#[derive(Deserialize, Clone, Debug, Default)]
pub struct DaysQuery {
    pub days: Option<u32>,
}
