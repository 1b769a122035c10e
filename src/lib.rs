//! ledger_gateway Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod batch;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod provisioning;

pub use config::Config;
pub use error::{AppError, AppResult};
