//! 等待名单订阅端点

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::api::services::admin::{
    ErrorCode, api_result, error_from_uxlog, error_response, json_response,
};
use crate::errors::UxlogError;
use crate::services::{EmailService, SubscribeRequest};
use crate::storage::SubscribeOutcome;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub project_id: i64,
    pub email: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub post_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub already_subscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingCountResponse {
    pub waiting_count: u64,
}

/// POST /api/email
///
/// 新订阅返回 201，重复订阅返回 200。
pub async fn subscribe(
    service: web::Data<Arc<EmailService>>,
    body: web::Json<EmailRequest>,
) -> actix_web::Result<HttpResponse> {
    let body = body.into_inner();
    let request = SubscribeRequest {
        project_id: body.project_id,
        email: body.email,
        channel: body.channel,
        post_number: body.post_number,
    };

    match service.subscribe(request).await {
        Ok(SubscribeOutcome::Created) => Ok(json_response(
            StatusCode::CREATED,
            ErrorCode::Success,
            "Subscribed",
            Some(SubscribeResponse {
                already_subscribed: false,
            }),
        )),
        Ok(SubscribeOutcome::AlreadySubscribed) => Ok(json_response(
            StatusCode::OK,
            ErrorCode::Success,
            "Already subscribed",
            Some(SubscribeResponse {
                already_subscribed: true,
            }),
        )),
        Err(UxlogError::Validation(msg)) => Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::EmailInvalid,
            &msg,
        )),
        Err(e) => Ok(error_from_uxlog(&e)),
    }
}

/// GET /api/projects/{id}/waiting-count
pub async fn waiting_count(
    service: web::Data<Arc<EmailService>>,
    path: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let result = service
        .waiting_count(path.into_inner())
        .await
        .map(|waiting_count| WaitingCountResponse { waiting_count });
    Ok(api_result(result))
}

pub fn email_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/email", web::post().to(subscribe))
        .route(
            "/projects/{id}/waiting-count",
            web::get().to(waiting_count),
        )
}
