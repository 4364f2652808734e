//! Waitlist email subscription service

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;

use crate::errors::{Result, UxlogError};
use crate::storage::{SeaOrmStorage, SubscribeOutcome};

use migration::entities::email_subscription;

/// 订阅请求
#[derive(Debug, Clone)]
pub struct SubscribeRequest {
    pub project_id: i64,
    pub email: String,
    pub channel: Option<String>,
    pub post_number: Option<String>,
}

/// 邮箱格式：`local@domain.tld`，tld 至少两个字母
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(UxlogError::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(UxlogError::validation("Invalid email format"));
    }
    Ok(())
}

pub struct EmailService {
    storage: Arc<SeaOrmStorage>,
}

impl EmailService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 订阅等待名单；同一项目下重复的邮箱返回 `AlreadySubscribed`
    pub async fn subscribe(&self, request: SubscribeRequest) -> Result<SubscribeOutcome> {
        validate_email(&request.email)?;
        self.storage.get_project(request.project_id).await?;

        let outcome = self
            .storage
            .insert_email(
                request.project_id,
                &request.email,
                request.channel.filter(|c| !c.is_empty()),
                request.post_number.filter(|p| !p.is_empty()),
            )
            .await?;

        if outcome == SubscribeOutcome::Created {
            info!(
                "New waitlist subscription for project {}",
                request.project_id
            );
        }
        Ok(outcome)
    }

    /// 展示用的等待人数：实际订阅数 + 项目的 waiting_offset
    pub async fn waiting_count(&self, project_id: i64) -> Result<u64> {
        let project = self.storage.get_project(project_id).await?;
        let emails = self.storage.count_emails(project_id).await?;
        Ok(emails.saturating_add(project.waiting_offset.max(0) as u64))
    }

    pub async fn list_emails(&self, project_id: i64) -> Result<Vec<email_subscription::Model>> {
        self.storage.list_emails(project_id).await
    }
}
