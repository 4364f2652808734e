//! 页面访问上报端点

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::trace;

use crate::api::services::admin::{ErrorCode, error_from_uxlog, error_response};
use crate::tracking::{TrackRequest, TrackingService};
use crate::utils::{extract_client_ip, extract_user_agent};

/// 渠道名最大长度（与 page_views.channel 列宽一致）
const MAX_CHANNEL_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackQuery {
    pub project_id: i64,
    pub channel: String,
    pub post_number: Option<String>,
    pub visitor_id: Option<String>,
}

/// GET /api/track?projectId=&channel=[&postNumber=][&visitorId=]
///
/// 成功返回 204；缓冲区不可用时同步落库，项目不存在返回 404。
pub async fn track(
    req: HttpRequest,
    query: web::Query<TrackQuery>,
    service: web::Data<Arc<TrackingService>>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();
    let channel = query.channel.trim();
    if channel.is_empty() || channel.len() > MAX_CHANNEL_LEN {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            "channel must be 1-100 characters",
        ));
    }

    let request = TrackRequest {
        project_id: query.project_id,
        channel: channel.to_string(),
        post_number: query.post_number.filter(|p| !p.is_empty()),
        visitor_id: query.visitor_id.filter(|v| !v.is_empty()),
        ip_address: extract_client_ip(&req),
        user_agent: extract_user_agent(&req),
    };

    match service.record(request).await {
        Ok(outcome) => {
            trace!("Track request handled: {:?}", outcome);
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => Ok(error_from_uxlog(&e)),
    }
}

pub fn tracking_routes() -> actix_web::Resource {
    web::resource("/api/track").route(web::get().to(track))
}
