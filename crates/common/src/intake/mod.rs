//! Lead intake pipeline
//!
//! validate → estimate → persist → notify. Persistence always completes
//! before any email is attempted, and a persistence failure stops the
//! pipeline before notification.

use crate::config::AppConfig;
use crate::db::{LeadStore, SavedApplication};
use crate::errors::{AppError, Result};
use crate::estimate;
use crate::metrics;
use crate::notify::{ContactDeliveries, Delivery, Notifier};
use crate::validation::{parse_application, parse_contact, ApplicationSubmission, ContactSubmission};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

/// Public message for rejected contact payloads
pub const CONTACT_VALIDATION_MESSAGE: &str = "Validation failed";

/// Public message for rejected application payloads
pub const APPLICATION_VALIDATION_MESSAGE: &str = "Validation error";

/// Accepted contact inquiry
#[derive(Debug, Clone)]
pub struct ContactOutcome {
    pub contact: ContactSubmission,
    pub deliveries: ContactDeliveries,
}

/// Accepted and persisted application
#[derive(Debug, Clone)]
pub struct ApplicationOutcome {
    pub application: ApplicationSubmission,
    pub saved: SavedApplication,
    pub email: Delivery,
}

/// Orchestrates validation, persistence and notification
#[derive(Clone)]
pub struct LeadIntake {
    store: Arc<dyn LeadStore>,
    notifier: Notifier,
    management_fee_percent: f64,
    operation_timeout: Duration,
}

impl LeadIntake {
    pub fn new(store: Arc<dyn LeadStore>, notifier: Notifier, config: &AppConfig) -> Self {
        Self {
            store,
            notifier,
            management_fee_percent: config.leads.management_fee_percent,
            operation_timeout: config.operation_timeout(),
        }
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Validate a contact inquiry and send both emails
    #[instrument(skip_all)]
    pub async fn submit_contact(&self, payload: serde_json::Value) -> Result<ContactOutcome> {
        let contact = parse_contact(payload).map_err(|errors| {
            metrics::record_lead("contact", "invalid");
            AppError::validation(CONTACT_VALIDATION_MESSAGE, errors)
        })?;

        let deliveries = self.notifier.notify_contact(&contact).await;

        metrics::record_lead("contact", "accepted");
        info!(
            has_property_details = contact.has_property_details(),
            notification = deliveries.notification.status.as_str(),
            auto_reply = deliveries.auto_reply.status.as_str(),
            "Contact form submission received"
        );

        Ok(ContactOutcome { contact, deliveries })
    }

    /// Validate, persist, then notify the business about an application
    #[instrument(skip_all)]
    pub async fn submit_application(&self, payload: serde_json::Value) -> Result<ApplicationOutcome> {
        let application = parse_application(payload).map_err(|errors| {
            metrics::record_lead("application", "invalid");
            AppError::validation(APPLICATION_VALIDATION_MESSAGE, errors)
        })?;

        let estimated = estimate::monthly_income(&application.profile());
        let saved = self.persist(&application, estimated).await?;

        let email = self.notifier.notify_application(&application, &saved).await;

        metrics::record_lead("application", "accepted");
        info!(
            application_id = %saved.application_id,
            estimated_monthly_income = saved.estimated_monthly_income,
            email = email.status.as_str(),
            "Application submitted"
        );

        Ok(ApplicationOutcome { application, saved, email })
    }

    async fn persist(
        &self,
        application: &ApplicationSubmission,
        estimated_monthly_income: u64,
    ) -> Result<SavedApplication> {
        let start = Instant::now();
        let backend = self.store.backend();

        let result = tokio::time::timeout(
            self.operation_timeout,
            self.store.save_application(application, estimated_monthly_income, self.management_fee_percent),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Timeout {
                operation: "save_application",
                timeout_ms: self.operation_timeout.as_millis() as u64,
            })
        });

        metrics::record_persistence(start.elapsed().as_secs_f64(), backend, result.is_ok());

        result.map_err(|e| {
            metrics::record_lead("application", "failed");
            error!(backend, error = %e, "Failed to persist application");
            e
        })
    }
}
