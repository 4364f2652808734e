//! Service layer for business logic
//!
//! This module provides the business logic shared between the HTTP API
//! and the CLI.

mod email_service;
mod project_service;
mod statistics_service;

pub use email_service::*;
pub use project_service::*;
pub use statistics_service::*;
