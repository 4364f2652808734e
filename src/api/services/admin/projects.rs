//! 项目管理端点

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::info;

use crate::errors::UxlogError;
use crate::services::{EmailService, ProjectService};

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_uxlog, error_response, json_response};
use super::types::{EmailResponse, ProjectRequest, ProjectResponse};

/// GET /api/admin/projects
pub async fn list_projects(
    service: web::Data<Arc<ProjectService>>,
) -> actix_web::Result<HttpResponse> {
    let result = service.list_projects().await.map(|projects| {
        projects
            .into_iter()
            .map(ProjectResponse::from)
            .collect::<Vec<_>>()
    });
    Ok(api_result(result))
}

/// POST /api/admin/projects
pub async fn create_project(
    service: web::Data<Arc<ProjectService>>,
    body: web::Json<ProjectRequest>,
) -> actix_web::Result<HttpResponse> {
    let request = body.into_inner();
    match service
        .create_project(&request.name, request.description, request.waiting_offset)
        .await
    {
        Ok(project) => {
            info!("Admin API: project created ({})", project.id);
            Ok(json_response(
                StatusCode::CREATED,
                ErrorCode::Success,
                "Created",
                Some(ProjectResponse::from(project)),
            ))
        }
        Err(UxlogError::Validation(msg)) => Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::ProjectInvalid,
            &msg,
        )),
        Err(e) => Ok(error_from_uxlog(&e)),
    }
}

/// GET /api/admin/projects/{id}
pub async fn get_project(
    service: web::Data<Arc<ProjectService>>,
    path: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let result = service
        .get_project(path.into_inner())
        .await
        .map(ProjectResponse::from);
    Ok(api_result(result))
}

/// GET /api/admin/projects/{id}/emails
pub async fn list_project_emails(
    service: web::Data<Arc<EmailService>>,
    path: web::Path<i64>,
) -> actix_web::Result<HttpResponse> {
    let result = service.list_emails(path.into_inner()).await.map(|emails| {
        emails
            .into_iter()
            .map(EmailResponse::from)
            .collect::<Vec<_>>()
    });
    Ok(api_result(result))
}
