//! LeadForge Common Library
//!
//! Shared code for the LeadForge intake service including:
//! - Lead validation and income estimation
//! - Database models, repository and migrations
//! - Rate limiting and Redis counters
//! - Email notification
//! - Error types, configuration, metrics

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod estimate;
pub mod intake;
pub mod metrics;
pub mod notify;
pub mod ratelimit;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{LeadStore, MemoryStore, Repository};
pub use errors::{AppError, Result};
pub use intake::LeadIntake;
pub use notify::{Mailer, Notifier};
pub use ratelimit::RateLimitStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
