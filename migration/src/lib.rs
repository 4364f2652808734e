pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261019_000001_projects;
mod m20261019_000002_page_views;
mod m20261019_000003_email_subscriptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_projects::Migration),
            Box::new(m20261019_000002_page_views::Migration),
            Box::new(m20261019_000003_email_subscriptions::Migration),
        ]
    }
}
