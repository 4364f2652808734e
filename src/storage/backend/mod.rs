//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod emails;
mod page_view_sink;
mod projects;
pub mod statistics;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, sea_query::Expr};
use tracing::{info, warn};

use crate::errors::{Result, UxlogError};
use crate::tracking::PageViewSink;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use emails::SubscribeOutcome;
pub use projects::NewProject;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(UxlogError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 裸文件路径补全为 sqlite URL
fn normalize_sqlite_url(database_url: &str) -> String {
    if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else if database_url == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}?mode=rwc", database_url)
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(UxlogError::database_config("database_url 未设置"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(&normalize_sqlite_url(database_url)).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
        };

        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn as_page_view_sink(self: &Arc<Self>) -> Arc<dyn PageViewSink> {
        Arc::clone(self) as Arc<dyn PageViewSink>
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn get_backend_name(&self) -> &str {
        &self.backend_name
    }

    pub(crate) fn db_backend(&self) -> DbBackend {
        match self.backend_name.as_str() {
            "sqlite" => DbBackend::Sqlite,
            "mysql" => DbBackend::MySql,
            _ => DbBackend::Postgres,
        }
    }

    /// 按 UTC 日期分桶的表达式（YYYY-MM-DD）
    pub(crate) fn day_expr(&self, column: &str) -> Expr {
        match self.db_backend() {
            DbBackend::Sqlite => Expr::cust(format!("strftime('%Y-%m-%d', {})", column)),
            DbBackend::MySql => Expr::cust(format!("DATE_FORMAT({}, '%Y-%m-%d')", column)),
            DbBackend::Postgres | _ => Expr::cust(format!(
                "TO_CHAR({} AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
                column
            )),
        }
    }

    /// 独立访客键：优先 visitor_id，否则 `ip:ua`
    pub(crate) fn visitor_key_sql(&self) -> &'static str {
        match self.db_backend() {
            DbBackend::MySql => {
                "COALESCE(visitor_id, CONCAT(COALESCE(ip_address, ''), ':', COALESCE(user_agent, '')))"
            }
            _ => "COALESCE(visitor_id, COALESCE(ip_address, '') || ':' || COALESCE(user_agent, ''))",
        }
    }

    pub(crate) fn unique_visitors_expr(&self) -> Expr {
        Expr::cust(format!("COUNT(DISTINCT {})", self.visitor_key_sql()))
    }

    /// 连通性检查
    pub async fn ping(&self) -> Result<()> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| UxlogError::database_connection(format!("数据库不可用: {}", e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        if let Err(e) = self.db.clone().close().await {
            warn!("Failed to close database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
    }
}
