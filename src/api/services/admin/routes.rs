//! Admin API 路由配置

use actix_web::web;

use super::projects::{create_project, get_project, list_project_emails, list_projects};
use super::statistics::{
    get_daily_post_stats, get_daily_stats, get_detailed_stats, get_post_daily_stats,
    get_post_stats, get_project_stats,
};

/// 项目路由 `/projects`
///
/// 包含：
/// - GET/POST /projects - 列表 / 创建
/// - GET /projects/{id} - 单个项目
/// - GET /projects/{id}/emails - 订阅列表
/// - GET /projects/{id}/stats[/daily|/posts|/daily-posts|/detailed] - 统计报表
pub fn projects_routes() -> actix_web::Scope {
    web::scope("/projects")
        .route("", web::get().to(list_projects))
        .route("", web::post().to(create_project))
        .route("/{id}", web::get().to(get_project))
        .route("/{id}/emails", web::get().to(list_project_emails))
        .service(stats_routes())
}

/// 统计路由 `/{id}/stats`
fn stats_routes() -> actix_web::Scope {
    web::scope("/{id}/stats")
        .route("", web::get().to(get_project_stats))
        .route("/daily", web::get().to(get_daily_stats))
        .route("/posts", web::get().to(get_post_stats))
        .route(
            "/posts/{post_number}/daily",
            web::get().to(get_post_daily_stats),
        )
        .route("/daily-posts", web::get().to(get_daily_post_stats))
        .route("/detailed", web::get().to(get_detailed_stats))
}

/// 挂载到 `/api/admin`
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/api/admin").service(projects_routes())
}
