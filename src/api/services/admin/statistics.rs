//! 统计报表端点
//!
//! 只有汇总接口会检查项目是否存在；按维度的接口对不存在的项目返回空列表。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use crate::errors::UxlogError;
use crate::services::StatisticsService;

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_response, resolve_days};
use super::types::DaysQuery;

fn invalid_days(err: &UxlogError) -> HttpResponse {
    error_response(
        StatusCode::BAD_REQUEST,
        ErrorCode::StatisticsInvalidDays,
        err.message(),
    )
}

/// GET /api/admin/projects/{id}/stats
pub async fn get_project_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let project_id = path.into_inner();
    Ok(api_result(service.get_project_statistics(project_id).await))
}

/// GET /api/admin/projects/{id}/stats/daily?days=
pub async fn get_daily_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<i64>,
    query: web::Query<DaysQuery>,
) -> actix_web::Result<HttpResponse> {
    let days = match resolve_days(query.days) {
        Ok(days) => days,
        Err(e) => return Ok(invalid_days(&e)),
    };
    let project_id = path.into_inner();
    Ok(api_result(
        service.get_daily_statistics(project_id, days).await,
    ))
}

/// GET /api/admin/projects/{id}/stats/posts
pub async fn get_post_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let project_id = path.into_inner();
    Ok(api_result(service.get_post_statistics(project_id).await))
}

/// GET /api/admin/projects/{id}/stats/posts/{post_number}/daily?days=
pub async fn get_post_daily_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<(i64, String)>,
    query: web::Query<DaysQuery>,
) -> actix_web::Result<HttpResponse> {
    let days = match resolve_days(query.days) {
        Ok(days) => days,
        Err(e) => return Ok(invalid_days(&e)),
    };
    let (project_id, post_number) = path.into_inner();
    Ok(api_result(
        service
            .get_post_daily_statistics(project_id, &post_number, days)
            .await,
    ))
}

/// GET /api/admin/projects/{id}/stats/daily-posts?days=
pub async fn get_daily_post_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<i64>,
    query: web::Query<DaysQuery>,
) -> actix_web::Result<HttpResponse> {
    let days = match resolve_days(query.days) {
        Ok(days) => days,
        Err(e) => return Ok(invalid_days(&e)),
    };
    let project_id = path.into_inner();
    Ok(api_result(
        service.get_daily_post_statistics(project_id, days).await,
    ))
}

/// GET /api/admin/projects/{id}/stats/detailed?days=
pub async fn get_detailed_stats(
    service: web::Data<Arc<StatisticsService>>,
    path: web::Path<i64>,
    query: web::Query<DaysQuery>,
) -> actix_web::Result<HttpResponse> {
    let days = match resolve_days(query.days) {
        Ok(days) => days,
        Err(e) => return Ok(invalid_days(&e)),
    };
    let project_id = path.into_inner();
    Ok(api_result(
        service.get_detailed_statistics(project_id, days).await,
    ))
}
