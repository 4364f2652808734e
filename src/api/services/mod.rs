pub mod admin;
pub mod email;
pub mod health;
pub mod tracking;

pub use admin::routes::admin_routes;
pub use email::email_routes;
pub use health::{AppStartTime, HealthService, health_routes};
pub use tracking::tracking_routes;
