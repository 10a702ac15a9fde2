//! Database layer for LeadForge
//!
//! Provides:
//! - SeaORM entity models
//! - The [`LeadStore`] seam used by the intake service
//! - A transactional Postgres repository and an in-memory store
//! - Connection pool management and migrations

pub mod models;
mod memory;
mod records;
mod repository;

pub use memory::{MemorySnapshot, MemoryStore};
pub use records::{normalize_email, property_description, property_title, ApplicationNotes};
pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use crate::validation::ApplicationSubmission;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Ids produced by one persisted application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedApplication {
    pub application_id: Uuid,
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub estimated_monthly_income: u64,
}

/// Persistence seam for lead submissions
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Upsert owner and property, then record a new application.
    ///
    /// All writes happen atomically: on error nothing is persisted.
    async fn save_application(
        &self,
        submission: &ApplicationSubmission,
        estimated_monthly_income: u64,
        management_fee_percent: f64,
    ) -> Result<SavedApplication>;

    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and readiness output
    fn backend(&self) -> &'static str;
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pub primary: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| AppError::Configuration {
            message: "database.url is not set".to_string(),
        })?;

        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let primary = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { primary })
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Apply pending SQL migrations from `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.primary.get_postgres_connection_pool();
        sqlx::migrate!("../../migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
