//! 统计相关的数据库查询
//!
//! 每个方法只负责一个维度的分组计数，合并与转化率计算在 StatisticsService 中完成。

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QuerySelect,
    sea_query::Expr,
};

use super::SeaOrmStorage;
use crate::errors::{Result, UxlogError};

use migration::entities::{email_subscription, page_view};

/// 未标注渠道的订阅归入该桶
pub const DIRECT_CHANNEL: &str = "direct";

// ============ 查询结果类型 ============

/// 访问分组结果行（渠道 / 日期 / 帖子）
#[derive(Debug, Clone, FromQueryResult)]
pub struct PageViewGroupRow {
    pub label: String,
    pub page_views: i64,
    pub unique_visitors: i64,
}

/// 订阅分组结果行
#[derive(Debug, Clone, FromQueryResult)]
pub struct EmailGroupRow {
    pub label: String,
    pub emails: i64,
}

/// 按日期 + 帖子分组的访问结果行
#[derive(Debug, Clone, FromQueryResult)]
pub struct DailyPostRow {
    pub day: String,
    pub post_number: String,
    pub page_views: i64,
    pub unique_visitors: i64,
}

/// 按日期 + 帖子分组的订阅结果行
#[derive(Debug, Clone, FromQueryResult)]
pub struct DailyPostEmailRow {
    pub day: String,
    pub post_number: String,
    pub emails: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

fn query_error(what: &str, e: sea_orm::DbErr) -> UxlogError {
    UxlogError::database_operation(format!("{}查询失败: {}", what, e))
}

impl SeaOrmStorage {
    fn page_views_of(
        &self,
        project_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> sea_orm::Select<page_view::Entity> {
        let mut query = page_view::Entity::find().filter(page_view::Column::ProjectId.eq(project_id));
        if let Some(since) = since {
            query = query.filter(page_view::Column::CreatedAt.gte(since));
        }
        query
    }

    fn emails_of(
        &self,
        project_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> sea_orm::Select<email_subscription::Entity> {
        let mut query = email_subscription::Entity::find()
            .filter(email_subscription::Column::ProjectId.eq(project_id));
        if let Some(since) = since {
            query = query.filter(email_subscription::Column::CreatedAt.gte(since));
        }
        query
    }

    // ============ 总量 ============

    pub async fn count_page_views(&self, project_id: i64) -> Result<u64> {
        self.page_views_of(project_id, None)
            .count(&self.db)
            .await
            .map_err(|e| query_error("访问总数", e))
    }

    /// 整个项目的独立访客数（跨渠道去重）
    pub async fn count_unique_visitors(&self, project_id: i64) -> Result<u64> {
        let row = self
            .page_views_of(project_id, None)
            .select_only()
            .column_as(self.unique_visitors_expr(), "count")
            .into_model::<CountRow>()
            .one(&self.db)
            .await
            .map_err(|e| query_error("独立访客", e))?;
        Ok(row.map(|r| r.count.max(0) as u64).unwrap_or(0))
    }

    pub async fn count_emails(&self, project_id: i64) -> Result<u64> {
        self.emails_of(project_id, None)
            .count(&self.db)
            .await
            .map_err(|e| query_error("订阅总数", e))
    }

    // ============ 按渠道 ============

    pub async fn page_views_by_channel(&self, project_id: i64) -> Result<Vec<PageViewGroupRow>> {
        self.page_views_of(project_id, None)
            .select_only()
            .column_as(page_view::Column::Channel, "label")
            .column_as(page_view::Column::Id.count(), "page_views")
            .column_as(self.unique_visitors_expr(), "unique_visitors")
            .group_by(page_view::Column::Channel)
            .into_model::<PageViewGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("渠道访问", e))
    }

    pub async fn emails_by_channel(&self, project_id: i64) -> Result<Vec<EmailGroupRow>> {
        let channel_expr = Expr::cust(format!("COALESCE(channel, '{}')", DIRECT_CHANNEL));
        self.emails_of(project_id, None)
            .select_only()
            .column_as(channel_expr.clone(), "label")
            .column_as(email_subscription::Column::Id.count(), "emails")
            .group_by(channel_expr)
            .into_model::<EmailGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("渠道订阅", e))
    }

    // ============ 按日期 ============

    /// 按 UTC 日期分组的访问数，可限定单个帖子
    pub async fn page_views_by_day(
        &self,
        project_id: i64,
        since: DateTime<Utc>,
        post_number: Option<&str>,
    ) -> Result<Vec<PageViewGroupRow>> {
        let day = self.day_expr("created_at");
        let mut query = self
            .page_views_of(project_id, Some(since))
            .select_only()
            .column_as(day.clone(), "label")
            .column_as(page_view::Column::Id.count(), "page_views")
            .column_as(self.unique_visitors_expr(), "unique_visitors");
        if let Some(post) = post_number {
            query = query.filter(page_view::Column::PostNumber.eq(post));
        }
        query
            .group_by(day)
            .into_model::<PageViewGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("每日访问", e))
    }

    pub async fn emails_by_day(
        &self,
        project_id: i64,
        since: DateTime<Utc>,
        post_number: Option<&str>,
    ) -> Result<Vec<EmailGroupRow>> {
        let day = self.day_expr("created_at");
        let mut query = self
            .emails_of(project_id, Some(since))
            .select_only()
            .column_as(day.clone(), "label")
            .column_as(email_subscription::Column::Id.count(), "emails");
        if let Some(post) = post_number {
            query = query.filter(email_subscription::Column::PostNumber.eq(post));
        }
        query
            .group_by(day)
            .into_model::<EmailGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("每日订阅", e))
    }

    // ============ 按帖子 ============

    pub async fn page_views_by_post(&self, project_id: i64) -> Result<Vec<PageViewGroupRow>> {
        self.page_views_of(project_id, None)
            .filter(page_view::Column::PostNumber.is_not_null())
            .select_only()
            .column_as(page_view::Column::PostNumber, "label")
            .column_as(page_view::Column::Id.count(), "page_views")
            .column_as(self.unique_visitors_expr(), "unique_visitors")
            .group_by(page_view::Column::PostNumber)
            .into_model::<PageViewGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("帖子访问", e))
    }

    pub async fn emails_by_post(&self, project_id: i64) -> Result<Vec<EmailGroupRow>> {
        self.emails_of(project_id, None)
            .filter(email_subscription::Column::PostNumber.is_not_null())
            .select_only()
            .column_as(email_subscription::Column::PostNumber, "label")
            .column_as(email_subscription::Column::Id.count(), "emails")
            .group_by(email_subscription::Column::PostNumber)
            .into_model::<EmailGroupRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("帖子订阅", e))
    }

    // ============ 按日期 + 帖子 ============

    pub async fn page_views_by_day_and_post(
        &self,
        project_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyPostRow>> {
        let day = self.day_expr("created_at");
        self.page_views_of(project_id, Some(since))
            .filter(page_view::Column::PostNumber.is_not_null())
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(page_view::Column::PostNumber, "post_number")
            .column_as(page_view::Column::Id.count(), "page_views")
            .column_as(self.unique_visitors_expr(), "unique_visitors")
            .group_by(day)
            .group_by(page_view::Column::PostNumber)
            .into_model::<DailyPostRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("每日帖子访问", e))
    }

    pub async fn emails_by_day_and_post(
        &self,
        project_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyPostEmailRow>> {
        let day = self.day_expr("created_at");
        self.emails_of(project_id, Some(since))
            .filter(email_subscription::Column::PostNumber.is_not_null())
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(email_subscription::Column::PostNumber, "post_number")
            .column_as(email_subscription::Column::Id.count(), "emails")
            .group_by(day)
            .group_by(email_subscription::Column::PostNumber)
            .into_model::<DailyPostEmailRow>()
            .all(&self.db)
            .await
            .map_err(|e| query_error("每日帖子订阅", e))
    }
}
