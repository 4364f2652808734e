//! Mode routing
//!
//! - Server mode: HTTP API plus the background drain worker
//! - Drain mode: one drain run against the configured buffer, then exit

pub mod drain;
pub mod server;

pub use drain::run_drain_once;
pub use server::run_server;
