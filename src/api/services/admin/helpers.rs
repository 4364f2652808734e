//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::errors::UxlogError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 UxlogError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_uxlog(err: &UxlogError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    error_response(status, ErrorCode::from(err), err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 UxlogError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<UxlogError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_uxlog(&e.into()),
    }
}

/// 校验并补全统计天数：缺省取配置默认值，范围 1..=max_days
pub fn resolve_days(days: Option<u32>) -> Result<u32, UxlogError> {
    let config = crate::config::get_config();
    let days = days.unwrap_or(config.statistics.default_days);
    if days == 0 || days > config.statistics.max_days {
        return Err(UxlogError::validation(format!(
            "days must be between 1 and {}",
            config.statistics.max_days
        )));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let response = success_response("success_data");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_response() {
        let response = error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            "Something went wrong",
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_from_uxlog_maps_status() {
        let response = error_from_uxlog(&UxlogError::not_found("Project not found: 9"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_from_uxlog(&UxlogError::buffer_unavailable("down"));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_api_result() {
        let ok: Result<u32, UxlogError> = Ok(1);
        assert_eq!(api_result(ok).status(), StatusCode::OK);

        let err: Result<u32, UxlogError> = Err(UxlogError::validation("bad"));
        assert_eq!(api_result(err).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resolve_days_bounds() {
        let config = crate::config::get_config();
        assert_eq!(
            resolve_days(None).unwrap(),
            config.statistics.default_days
        );
        assert_eq!(resolve_days(Some(7)).unwrap(), 7);
        assert!(resolve_days(Some(0)).is_err());
        assert!(resolve_days(Some(config.statistics.max_days + 1)).is_err());
    }
}
