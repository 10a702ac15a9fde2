//! Contact form handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::handlers::json_body;
use crate::middleware::ClientId;
use crate::AppState;
use leadforge_common::{
    errors::{AppError, Result},
    intake::CONTACT_VALIDATION_MESSAGE,
    metrics,
};

/// Public message for contact failures past validation
pub const CONTACT_FAILURE_MESSAGE: &str =
    "An error occurred while processing your request. Please try again.";

const CONTACT_SUCCESS_MESSAGE: &str =
    "Thank you for your inquiry! We'll get back to you within 24 hours.";

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: ContactDelivery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDelivery {
    pub notification_sent: bool,
    pub auto_reply_sent: bool,
    pub email_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoResponse {
    pub message: &'static str,
    pub email_configured: bool,
    pub config: MailerInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailerInfo {
    pub configured: bool,
    pub api_base: String,
    pub sender: String,
}

/// Accept a contact inquiry
///
/// POST /contact
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    // Rate limiting comes before the body is even looked at
    match state.contact_limiter.check(&client).await {
        Ok(decision) if !decision.allowed => {
            metrics::record_rate_limited("contact");
            tracing::warn!(backend = state.contact_limiter.backend(), "Contact rate limit exceeded");
            return Err(AppError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            });
        }
        Ok(_) => {}
        // Fail open: a limiter outage must not block inquiries
        Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable, allowing request"),
    }

    let payload = json_body(body, CONTACT_VALIDATION_MESSAGE)?;

    let outcome = state
        .intake
        .submit_contact(payload)
        .await
        .map_err(|e| e.masked(CONTACT_FAILURE_MESSAGE))?;

    Ok(Json(ContactResponse {
        success: true,
        message: CONTACT_SUCCESS_MESSAGE,
        data: ContactDelivery {
            notification_sent: outcome.deliveries.notification.delivered(),
            auto_reply_sent: outcome.deliveries.auto_reply.delivered(),
            email_configured: state.intake.notifier().is_configured(),
        },
    }))
}

/// Describe the contact endpoint and mail transport
///
/// GET /contact
pub async fn contact_info(State(state): State<AppState>) -> Json<ContactInfoResponse> {
    let configured = state.intake.notifier().is_configured();

    Json(ContactInfoResponse {
        message: "Contact form API endpoint",
        email_configured: configured,
        config: MailerInfo {
            configured,
            api_base: state.config.email.api_base.clone(),
            sender: state.config.email.from.clone(),
        },
    })
}
