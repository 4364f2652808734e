//! 邮件订阅表读写

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use tracing::debug;

use super::SeaOrmStorage;
use crate::errors::{Result, UxlogError};

use migration::entities::email_subscription;

/// 新增订阅的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    AlreadySubscribed,
}

impl SeaOrmStorage {
    pub async fn email_exists(&self, project_id: i64, email: &str) -> Result<bool> {
        let count = email_subscription::Entity::find()
            .filter(email_subscription::Column::ProjectId.eq(project_id))
            .filter(email_subscription::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询订阅失败: {}", e)))?;
        Ok(count > 0)
    }

    /// 写入订阅；(project_id, email) 已存在时返回 `AlreadySubscribed`
    pub async fn insert_email(
        &self,
        project_id: i64,
        email: &str,
        channel: Option<String>,
        post_number: Option<String>,
    ) -> Result<SubscribeOutcome> {
        if self.email_exists(project_id, email).await? {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let result = email_subscription::ActiveModel {
            project_id: Set(project_id),
            channel: Set(channel),
            post_number: Set(post_number),
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(model) => {
                debug!("Email subscription stored: id={}, project={}", model.id, project_id);
                Ok(SubscribeOutcome::Created)
            }
            // 并发重复提交由唯一索引兜底
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Err(e) => Err(UxlogError::database_operation(format!(
                "写入订阅失败: {}",
                e
            ))),
        }
    }

    /// 项目下全部订阅，最新的在前
    pub async fn list_emails(&self, project_id: i64) -> Result<Vec<email_subscription::Model>> {
        email_subscription::Entity::find()
            .filter(email_subscription::Column::ProjectId.eq(project_id))
            .order_by_desc(email_subscription::Column::CreatedAt)
            .order_by_desc(email_subscription::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询订阅列表失败: {}", e)))
    }
}
