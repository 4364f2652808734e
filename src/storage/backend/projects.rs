//! 项目表读写

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};
use tracing::info;

use super::SeaOrmStorage;
use crate::errors::{Result, UxlogError};

use migration::entities::project;

/// 新建项目的输入
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub waiting_offset: i64,
}

impl SeaOrmStorage {
    pub async fn create_project(&self, input: NewProject) -> Result<project::Model> {
        let model = project::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            waiting_offset: Set(input.waiting_offset),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| UxlogError::database_operation(format!("创建项目失败: {}", e)))?;

        info!("Project created: id={}, name={}", model.id, model.name);
        Ok(model)
    }

    pub async fn find_project(&self, project_id: i64) -> Result<Option<project::Model>> {
        project::Entity::find_by_id(project_id)
            .one(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询项目失败: {}", e)))
    }

    /// 按 id 获取项目，不存在时返回 `NotFound`
    pub async fn get_project(&self, project_id: i64) -> Result<project::Model> {
        self.find_project(project_id)
            .await?
            .ok_or_else(|| UxlogError::not_found(format!("Project not found: {}", project_id)))
    }

    pub async fn list_projects(&self) -> Result<Vec<project::Model>> {
        project::Entity::find()
            .order_by_asc(project::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询项目列表失败: {}", e)))
    }
}
