//! Project management service

use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, UxlogError};
use crate::storage::{NewProject, SeaOrmStorage};

use migration::entities::project;

/// 项目名称最大长度
const MAX_PROJECT_NAME_LEN: usize = 255;

pub struct ProjectService {
    storage: Arc<SeaOrmStorage>,
}

impl ProjectService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_project(
        &self,
        name: &str,
        description: Option<String>,
        waiting_offset: i64,
    ) -> Result<project::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UxlogError::validation("Project name is required"));
        }
        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(UxlogError::validation(format!(
                "Project name must be at most {} characters",
                MAX_PROJECT_NAME_LEN
            )));
        }
        if waiting_offset < 0 {
            return Err(UxlogError::validation("waitingOffset must not be negative"));
        }

        let project = self
            .storage
            .create_project(NewProject {
                name: name.to_string(),
                description: description.filter(|d| !d.trim().is_empty()),
                waiting_offset,
            })
            .await?;
        info!("ProjectService: created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    pub async fn list_projects(&self) -> Result<Vec<project::Model>> {
        self.storage.list_projects().await
    }

    pub async fn get_project(&self, project_id: i64) -> Result<project::Model> {
        self.storage.get_project(project_id).await
    }
}
