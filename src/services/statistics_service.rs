//! Statistics service layer
//!
//! 把按渠道 / 日期 / 帖子分组的访问与订阅计数合并成报表。
//! 访问和订阅分别查询，键取两者的并集，缺失的一侧计为 0。

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::{Result, UxlogError};
use crate::storage::SeaOrmStorage;
use crate::storage::backend::statistics::{
    DailyPostEmailRow, DailyPostRow, EmailGroupRow, PageViewGroupRow,
};

/// 统计窗口起点 `now - days`，超出可表示的时间范围时报校验错误
fn window_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| UxlogError::validation(format!("days out of range: {}", days)))
}

// ============ 报表类型 ============

/// 整个项目的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatistics {
    pub project_id: i64,
    pub project_name: String,
    pub total_page_views: u64,
    pub total_unique_visitors: u64,
    pub total_emails: u64,
    pub conversion_rate: f64,
    pub channel_stats: Vec<ChannelStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    pub channel: String,
    pub page_views: u64,
    pub unique_visitors: u64,
    pub emails: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatistics {
    pub date: NaiveDate,
    pub page_views: u64,
    pub unique_visitors: u64,
    pub emails: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStatistics {
    pub post_number: String,
    pub page_views: u64,
    pub unique_visitors: u64,
    pub emails: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPostStatistics {
    pub date: NaiveDate,
    pub post_number: String,
    pub page_views: u64,
    pub unique_visitors: u64,
    pub emails: u64,
    pub conversion_rate: f64,
}

/// 汇总 + 每日 + 帖子
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatistics {
    pub summary: ProjectStatistics,
    pub daily_stats: Vec<DailyStatistics>,
    pub post_stats: Vec<PostStatistics>,
}

// ============ 合并 ============

/// 转化率（百分比），分母是独立访客而不是访问量
pub fn conversion_rate(unique_visitors: u64, emails: u64) -> f64 {
    if unique_visitors > 0 {
        emails as f64 / unique_visitors as f64 * 100.0
    } else {
        0.0
    }
}

/// 同一个键下的三项计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub page_views: u64,
    pub unique_visitors: u64,
    pub emails: u64,
}

impl Counts {
    pub fn conversion_rate(&self) -> f64 {
        conversion_rate(self.unique_visitors, self.emails)
    }
}

fn non_negative(value: i64) -> u64 {
    value.max(0) as u64
}

/// 按键合并访问行与订阅行，结果包含两侧键的并集
pub fn merge_counts<K: Ord>(
    page_views: impl IntoIterator<Item = (K, u64, u64)>,
    emails: impl IntoIterator<Item = (K, u64)>,
) -> BTreeMap<K, Counts> {
    let mut merged: BTreeMap<K, Counts> = BTreeMap::new();
    for (key, views, visitors) in page_views {
        let entry = merged.entry(key).or_default();
        entry.page_views += views;
        entry.unique_visitors += visitors;
    }
    for (key, count) in emails {
        merged.entry(key).or_default().emails += count;
    }
    merged
}

fn parse_day(label: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .map_err(|e| UxlogError::date_parse(format!("Invalid day bucket '{}': {}", label, e)))
}

fn page_view_keys(rows: Vec<PageViewGroupRow>) -> Vec<(String, u64, u64)> {
    rows.into_iter()
        .map(|r| (r.label, non_negative(r.page_views), non_negative(r.unique_visitors)))
        .collect()
}

fn email_keys(rows: Vec<EmailGroupRow>) -> Vec<(String, u64)> {
    rows.into_iter()
        .map(|r| (r.label, non_negative(r.emails)))
        .collect()
}

fn page_view_days(rows: Vec<PageViewGroupRow>) -> Result<Vec<(NaiveDate, u64, u64)>> {
    rows.into_iter()
        .map(|r| {
            Ok((
                parse_day(&r.label)?,
                non_negative(r.page_views),
                non_negative(r.unique_visitors),
            ))
        })
        .collect()
}

fn email_days(rows: Vec<EmailGroupRow>) -> Result<Vec<(NaiveDate, u64)>> {
    rows.into_iter()
        .map(|r| Ok((parse_day(&r.label)?, non_negative(r.emails))))
        .collect()
}

fn daily_report(merged: BTreeMap<NaiveDate, Counts>) -> Vec<DailyStatistics> {
    // BTreeMap 升序，反转即为日期倒序
    merged
        .into_iter()
        .rev()
        .map(|(date, c)| DailyStatistics {
            date,
            page_views: c.page_views,
            unique_visitors: c.unique_visitors,
            emails: c.emails,
            conversion_rate: c.conversion_rate(),
        })
        .collect()
}

// ============ StatisticsService ============

pub struct StatisticsService {
    storage: Arc<SeaOrmStorage>,
}

impl StatisticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 整个项目的汇总，项目不存在时返回 `NotFound`
    ///
    /// 总访客和总订阅直接计数，不由渠道相加，跨渠道的同一访客只算一次。
    pub async fn get_project_statistics(&self, project_id: i64) -> Result<ProjectStatistics> {
        let project = self.storage.get_project(project_id).await?;

        let (total_page_views, total_unique_visitors, total_emails, by_channel, emails_by_channel) = tokio::try_join!(
            self.storage.count_page_views(project_id),
            self.storage.count_unique_visitors(project_id),
            self.storage.count_emails(project_id),
            self.storage.page_views_by_channel(project_id),
            self.storage.emails_by_channel(project_id),
        )?;

        let merged = merge_counts(page_view_keys(by_channel), email_keys(emails_by_channel));
        let mut channel_stats: Vec<ChannelStatistics> = merged
            .into_iter()
            .map(|(channel, c)| ChannelStatistics {
                channel,
                page_views: c.page_views,
                unique_visitors: c.unique_visitors,
                emails: c.emails,
                conversion_rate: c.conversion_rate(),
            })
            .collect();
        // 键已按名称升序，稳定排序后同访问量按名称排列
        channel_stats.sort_by(|a, b| b.page_views.cmp(&a.page_views));

        debug!(
            "Project {} statistics: views={}, visitors={}, emails={}",
            project_id, total_page_views, total_unique_visitors, total_emails
        );

        Ok(ProjectStatistics {
            project_id: project.id,
            project_name: project.name,
            total_page_views,
            total_unique_visitors,
            total_emails,
            conversion_rate: conversion_rate(total_unique_visitors, total_emails),
            channel_stats,
        })
    }

    /// 最近 `days` 天按日统计，日期倒序
    pub async fn get_daily_statistics(
        &self,
        project_id: i64,
        days: u32,
    ) -> Result<Vec<DailyStatistics>> {
        self.daily_statistics(project_id, None, days).await
    }

    /// 单个帖子最近 `days` 天按日统计
    pub async fn get_post_daily_statistics(
        &self,
        project_id: i64,
        post_number: &str,
        days: u32,
    ) -> Result<Vec<DailyStatistics>> {
        self.daily_statistics(project_id, Some(post_number), days)
            .await
    }

    async fn daily_statistics(
        &self,
        project_id: i64,
        post_number: Option<&str>,
        days: u32,
    ) -> Result<Vec<DailyStatistics>> {
        let since = window_start(Utc::now(), days)?;

        let (views, emails) = tokio::try_join!(
            self.storage.page_views_by_day(project_id, since, post_number),
            self.storage.emails_by_day(project_id, since, post_number),
        )?;

        let merged = merge_counts(page_view_days(views)?, email_days(emails)?);
        Ok(daily_report(merged))
    }

    /// 按帖子统计（忽略没有帖子编号的记录），访问量倒序
    pub async fn get_post_statistics(&self, project_id: i64) -> Result<Vec<PostStatistics>> {
        let (views, emails) = tokio::try_join!(
            self.storage.page_views_by_post(project_id),
            self.storage.emails_by_post(project_id),
        )?;

        let mut stats: Vec<PostStatistics> =
            merge_counts(page_view_keys(views), email_keys(emails))
                .into_iter()
                .map(|(post_number, c)| PostStatistics {
                    post_number,
                    page_views: c.page_views,
                    unique_visitors: c.unique_visitors,
                    emails: c.emails,
                    conversion_rate: c.conversion_rate(),
                })
                .collect();
        stats.sort_by(|a, b| b.page_views.cmp(&a.page_views));
        Ok(stats)
    }

    /// 最近 `days` 天按日期 + 帖子统计，日期倒序，同一天内访问量倒序
    pub async fn get_daily_post_statistics(
        &self,
        project_id: i64,
        days: u32,
    ) -> Result<Vec<DailyPostStatistics>> {
        let since = window_start(Utc::now(), days)?;

        let (views, emails) = tokio::try_join!(
            self.storage.page_views_by_day_and_post(project_id, since),
            self.storage.emails_by_day_and_post(project_id, since),
        )?;

        let views = views
            .into_iter()
            .map(|r: DailyPostRow| {
                Ok((
                    (parse_day(&r.day)?, r.post_number),
                    non_negative(r.page_views),
                    non_negative(r.unique_visitors),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let emails = emails
            .into_iter()
            .map(|r: DailyPostEmailRow| {
                Ok(((parse_day(&r.day)?, r.post_number), non_negative(r.emails)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut stats: Vec<DailyPostStatistics> = merge_counts(views, emails)
            .into_iter()
            .map(|((date, post_number), c)| DailyPostStatistics {
                date,
                post_number,
                page_views: c.page_views,
                unique_visitors: c.unique_visitors,
                emails: c.emails,
                conversion_rate: c.conversion_rate(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.page_views.cmp(&a.page_views))
        });
        Ok(stats)
    }

    pub async fn get_detailed_statistics(
        &self,
        project_id: i64,
        days: u32,
    ) -> Result<DetailedStatistics> {
        let summary = self.get_project_statistics(project_id).await?;
        let (daily_stats, post_stats) = tokio::try_join!(
            self.get_daily_statistics(project_id, days),
            self.get_post_statistics(project_id),
        )?;

        Ok(DetailedStatistics {
            summary,
            daily_stats,
            post_stats,
        })
    }
}
