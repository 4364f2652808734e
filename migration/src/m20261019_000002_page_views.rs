//! 页面访问表迁移
//!
//! 创建 page_views 表，存储由缓冲区批量写入（或降级直写）的访问记录。

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
                    .table(PageViews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PageViews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PageViews::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(PageViews::Channel).string_len(100).not_null())
                    .col(ColumnDef::new(PageViews::PostNumber).string_len(100).null())
                    .col(ColumnDef::new(PageViews::VisitorId).string_len(255).null())
                    .col(ColumnDef::new(PageViews::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(PageViews::UserAgent).string_len(500).null())
                    .col(
                        ColumnDef::new(PageViews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_views_project")
                            .from(PageViews::Table, PageViews::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 渠道统计
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_project_channel")
                    .table(PageViews::Table)
                    .col(PageViews::ProjectId)
                    .col(PageViews::Channel)
                    .to_owned(),
            )
            .await?;

        // 按日统计（时间窗口过滤）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_created_at")
                    .table(PageViews::Table)
                    .col(PageViews::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_visitor_id")
                    .table(PageViews::Table)
                    .col(PageViews::VisitorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_page_views_visitor_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_page_views_created_at").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_page_views_project_channel")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PageViews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PageViews {
    #[sea_orm(iden = "page_views")]
    Table,
    Id,
    ProjectId,
    Channel,
    PostNumber,
    VisitorId,
    IpAddress,
    UserAgent,
    CreatedAt,
}
