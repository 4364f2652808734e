//! uxlog - waitlist analytics backend
//!
//! Page views are pushed onto a buffer (Redis list) and drained into the
//! relational store in batches by a single background worker; statistics
//! are aggregated on demand from the stored rows.
//!
//! # Architecture
//! - `tracking`: event buffer, batch drain and the drain worker
//! - `storage`: SeaORM backend (projects, page views, email subscriptions)
//! - `services`: statistics, projects and waitlist emails
//! - `api`: HTTP handlers and routes
//! - `config`: static configuration
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging initialization

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod tracking;
pub mod utils;
