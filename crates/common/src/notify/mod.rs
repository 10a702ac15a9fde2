//! Notification dispatch
//!
//! Provides a unified interface for outgoing email:
//! - [`HttpMailer`] posts to a transactional email HTTP API
//! - [`DisabledMailer`] stands in when no API key is configured
//!
//! [`Notifier`] renders the lead templates and never escalates a delivery
//! failure: each send resolves to a [`Delivery`] the caller reports back.

mod templates;

pub use templates::{escape_html, html_to_text};

use crate::config::{AppConfig, BrandConfig, EmailConfig};
use crate::db::SavedApplication;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::validation::{ApplicationSubmission, ContactSubmission};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one email send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    /// Accepted without a configured transport
    Simulated,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Simulated => "simulated",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// Per-channel result reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// False only when the send failed
    pub success: bool,
    pub status: DeliveryStatus,
    pub message: String,
}

impl Delivery {
    fn sent() -> Self {
        Self {
            success: true,
            status: DeliveryStatus::Sent,
            message: "Email sent successfully".to_string(),
        }
    }

    fn simulated() -> Self {
        Self {
            success: true,
            status: DeliveryStatus::Simulated,
            message: "Email service not configured - message would be sent in production"
                .to_string(),
        }
    }

    fn failed(error: &AppError) -> Self {
        Self {
            success: false,
            status: DeliveryStatus::Failed,
            message: format!("Failed to send email: {}", error),
        }
    }

    /// Whether the message actually left through a transport
    pub fn delivered(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Trait for email transports
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryStatus>;

    /// Whether messages are really delivered
    fn is_configured(&self) -> bool;
}

/// Build the mailer for the given configuration
pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(Arc::new(HttpMailer::new(
            key.to_string(),
            config.api_base.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        _ => {
            warn!("Email API key not configured. Emails will not be sent.");
            Ok(Arc::new(DisabledMailer))
        }
    }
}

// ============================================================================
// HTTP transport
// ============================================================================

/// Client for a Resend-style `/emails` endpoint
pub struct HttpMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpMailer {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryStatus> {
        let url = format!("{}/emails", self.base_url);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Notification {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notification {
                message: format!("API error {}: {}", status, body),
            });
        }

        Ok(DeliveryStatus::Sent)
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Logs instead of sending
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryStatus> {
        info!(subject = %message.subject, "Email service not configured, simulating send");
        Ok(DeliveryStatus::Simulated)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Results of the two contact emails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDeliveries {
    pub notification: Delivery,
    pub auto_reply: Delivery,
}

/// Renders lead emails and hands them to the mailer
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
    business_inbox: String,
    brand: BrandConfig,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: &AppConfig) -> Self {
        Self {
            mailer,
            from: config.email.from.clone(),
            business_inbox: config.email.business_inbox.clone(),
            brand: config.brand.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    fn message(&self, to: &str, rendered: templates::Rendered) -> EmailMessage {
        EmailMessage {
            from: self.from.clone(),
            to: vec![to.to_string()],
            text: html_to_text(&rendered.html),
            subject: rendered.subject,
            html: rendered.html,
        }
    }

    async fn dispatch(&self, template: &'static str, message: EmailMessage) -> Delivery {
        let delivery = match self.mailer.send(&message).await {
            Ok(DeliveryStatus::Sent) => Delivery::sent(),
            Ok(DeliveryStatus::Simulated) => Delivery::simulated(),
            Ok(DeliveryStatus::Failed) => Delivery::failed(&AppError::Notification {
                message: "transport reported failure".to_string(),
            }),
            Err(e) => {
                warn!(template, error = %e, "Email delivery failed");
                Delivery::failed(&e)
            }
        };

        metrics::record_email(template, delivery.status.as_str());
        info!(template, status = delivery.status.as_str(), "Email dispatched");
        delivery
    }

    /// Business notification and auto-reply, sent concurrently
    pub async fn notify_contact(&self, contact: &ContactSubmission) -> ContactDeliveries {
        let notification = self.message(
            &self.business_inbox,
            templates::contact_notification(contact, &self.brand),
        );
        let auto_reply = self.message(
            &contact.email,
            templates::contact_auto_reply(contact, &self.brand),
        );

        let (notification, auto_reply) = futures::join!(
            self.dispatch("contact_notification", notification),
            self.dispatch("auto_reply", auto_reply)
        );

        ContactDeliveries { notification, auto_reply }
    }

    /// Business notification for a persisted application
    pub async fn notify_application(
        &self,
        application: &ApplicationSubmission,
        saved: &SavedApplication,
    ) -> Delivery {
        let message = self.message(
            &self.business_inbox,
            templates::application_notification(application, saved, &self.brand),
        );
        self.dispatch("application_notification", message).await
    }
}
