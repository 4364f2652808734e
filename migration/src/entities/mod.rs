pub mod email_subscription;
pub mod page_view;
pub mod project;

pub use email_subscription::Entity as EmailSubscriptionEntity;
pub use page_view::Entity as PageViewEntity;
pub use project::Entity as ProjectEntity;
