use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

use crate::api::services::admin::{ApiResponse, ErrorCode};
use crate::storage::SeaOrmStorage;
use crate::tracking::{EventBuffer, TrackingService};

/// 单项检查的超时
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBufferCheck {
    pub status: String,
    pub buffer_type: String,
    /// 尚未落库的事件数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub buffer: HealthBufferCheck,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

async fn check_storage(storage: &SeaOrmStorage) -> HealthStorageCheck {
    let backend = storage.get_backend_name().to_string();
    match tokio::time::timeout(CHECK_TIMEOUT, storage.ping()).await {
        Ok(Ok(())) => HealthStorageCheck {
            status: "healthy".to_string(),
            backend,
            error: None,
        },
        Ok(Err(e)) => {
            error!("Storage health check failed: {}", e);
            HealthStorageCheck {
                status: "unhealthy".to_string(),
                backend,
                error: Some(e.to_string()),
            }
        }
        Err(_) => {
            error!("Storage health check timeout");
            HealthStorageCheck {
                status: "unhealthy".to_string(),
                backend,
                error: Some("timeout".to_string()),
            }
        }
    }
}

async fn check_buffer(buffer: &dyn EventBuffer, key: &str) -> HealthBufferCheck {
    let buffer_type = buffer.buffer_type().to_string();
    match tokio::time::timeout(CHECK_TIMEOUT, buffer.backlog(key)).await {
        Ok(Ok(backlog)) => HealthBufferCheck {
            status: "healthy".to_string(),
            buffer_type,
            backlog: Some(backlog),
            error: None,
        },
        Ok(Err(e)) => HealthBufferCheck {
            // 缓冲区故障时写入会降级为直写，服务仍可用
            status: "degraded".to_string(),
            buffer_type,
            backlog: None,
            error: Some(e.to_string()),
        },
        Err(_) => HealthBufferCheck {
            status: "degraded".to_string(),
            buffer_type,
            backlog: None,
            error: Some("timeout".to_string()),
        },
    }
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        tracking: web::Data<Arc<TrackingService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let (storage_status, buffer_status) = tokio::join!(
            check_storage(&storage),
            check_buffer(tracking.buffer().as_ref(), tracking.key()),
        );

        let now = chrono::Utc::now();
        let uptime = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage_status.status == "healthy";
        let status = if !is_healthy {
            "unhealthy"
        } else if buffer_status.status != "healthy" {
            "degraded"
        } else {
            "healthy"
        };

        let health_data = HealthResponse {
            status: status.to_string(),
            timestamp: now.to_rfc3339(),
            uptime,
            checks: HealthChecks {
                storage: storage_status,
                buffer: buffer_status,
            },
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        let health_response = ApiResponse {
            code: if is_healthy {
                ErrorCode::Success as i32
            } else {
                ErrorCode::ServiceUnavailable as i32
            },
            message: if is_healthy {
                "OK".to_string()
            } else {
                "Service Unavailable".to_string()
            },
            data: Some(health_data),
        };

        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        debug!(
            "Health check completed in {:?}, status: {}",
            start_time.elapsed(),
            status
        );

        HttpResponse::build(response_status)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(health_response)
    }

    // 就绪检查：数据库可用即就绪
    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        trace!("Received readiness check request");

        match tokio::time::timeout(CHECK_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK"),
            _ => HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("NOT READY"),
        }
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
