//! PageViewSink implementation for SeaOrmStorage

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::debug;

use super::SeaOrmStorage;
use crate::errors::{Result, UxlogError};
use crate::tracking::{PageViewSink, TrackingEvent};

use migration::entities::{page_view, project};

fn to_active_model(event: TrackingEvent) -> page_view::ActiveModel {
    page_view::ActiveModel {
        project_id: Set(event.project_id),
        channel: Set(event.channel),
        post_number: Set(event.post_number),
        visitor_id: Set(event.visitor_id),
        ip_address: Set(event.ip_address),
        user_agent: Set(event.user_agent),
        created_at: Set(event.created_at),
        ..Default::default()
    }
}

#[async_trait]
impl PageViewSink for SeaOrmStorage {
    async fn insert_page_view(&self, event: TrackingEvent) -> Result<()> {
        let exists = project::Entity::find_by_id(event.project_id)
            .one(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询项目失败: {}", e)))?
            .is_some();
        if !exists {
            return Err(UxlogError::not_found(format!(
                "Project not found: {}",
                event.project_id
            )));
        }

        page_view::Entity::insert(to_active_model(event))
            .exec(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("写入访问记录失败: {}", e)))?;
        Ok(())
    }

    async fn insert_page_views(&self, events: Vec<TrackingEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let total = events.len();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| UxlogError::database_operation(format!("开始事务失败: {}", e)))?;

        let models: Vec<page_view::ActiveModel> = events.into_iter().map(to_active_model).collect();
        page_view::Entity::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|e| UxlogError::database_operation(format!("批量写入访问记录失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| UxlogError::database_operation(format!("提交事务失败: {}", e)))?;

        debug!(
            "Page views written to {} database ({} records)",
            self.backend_name.to_uppercase(),
            total
        );
        Ok(())
    }

    async fn existing_project_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<i64> = project::Entity::find()
            .select_only()
            .column(project::Column::Id)
            .filter(project::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| UxlogError::database_operation(format!("查询项目失败: {}", e)))?;
        Ok(found.into_iter().collect())
    }
}
