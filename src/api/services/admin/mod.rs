//! Admin API 服务模块
//!
//! 该模块包含管理 API 的所有端点，包括：
//! - 项目创建与查询
//! - 订阅列表
//! - 统计报表

pub mod error_code;
mod helpers;
mod projects;
pub mod routes;
mod statistics;
mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    api_result, error_from_uxlog, error_response, json_response, resolve_days, success_response,
};

// 重新导出错误码
pub use error_code::ErrorCode;

pub use projects::{create_project, get_project, list_project_emails, list_projects};
pub use statistics::{
    get_daily_post_stats, get_daily_stats, get_detailed_stats, get_post_daily_stats,
    get_post_stats, get_project_stats,
};
