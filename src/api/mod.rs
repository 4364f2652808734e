//! HTTP API
//!
//! - `/api/track`：访问上报
//! - `/api/email`、`/api/projects/{id}/waiting-count`：等待名单
//! - `/api/admin/...`：项目与统计
//! - `/health`：健康检查

pub mod services;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, error::InternalError, web};

use services::admin::{ErrorCode, error_response};

fn bad_request(message: String) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message)
}

/// 请求体和查询参数解析失败时也返回统一的 JSON 包装
fn extractor_configs() -> (web::JsonConfig, web::QueryConfig, web::PathConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {}", err);
        InternalError::from_response(err, bad_request(message)).into()
    });
    let query = web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query parameters: {}", err);
        InternalError::from_response(err, bad_request(message)).into()
    });
    let path = web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid path parameter: {}", err);
        InternalError::from_response(err, bad_request(message)).into()
    });
    (json, query, path)
}

/// 注册全部路由
///
/// `/api/admin` 必须先于 `/api` 注册，否则会被公共 scope 截获。
pub fn configure(cfg: &mut web::ServiceConfig) {
    let (json, query, path) = extractor_configs();
    cfg.app_data(json)
        .app_data(query)
        .app_data(path)
        .service(services::tracking_routes())
        .service(services::admin_routes())
        .service(services::email_routes())
        .service(services::health_routes());
}
