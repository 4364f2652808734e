//! 邮件订阅表迁移

use sea_orm_migration::prelude::*;

use crate::m20261019_000001_projects::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSubscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailSubscriptions::ProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailSubscriptions::Channel)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EmailSubscriptions::PostNumber)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(EmailSubscriptions::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_subscriptions_project")
                            .from(EmailSubscriptions::Table, EmailSubscriptions::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一项目内邮箱唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_email_subscriptions_project_email")
                    .table(EmailSubscriptions::Table)
                    .col(EmailSubscriptions::ProjectId)
                    .col(EmailSubscriptions::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_email_subscriptions_created_at")
                    .table(EmailSubscriptions::Table)
                    .col(EmailSubscriptions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_email_subscriptions_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_email_subscriptions_project_email")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(EmailSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EmailSubscriptions {
    #[sea_orm(iden = "email_subscriptions")]
    Table,
    Id,
    ProjectId,
    Channel,
    PostNumber,
    Email,
    CreatedAt,
}
