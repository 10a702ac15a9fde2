//! Property application handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::handlers::json_body;
use crate::AppState;
use leadforge_common::{
    errors::{Result, INTERNAL_ERROR_MESSAGE},
    intake::APPLICATION_VALIDATION_MESSAGE,
    notify::Delivery,
    validation::ApplicationSubmission,
};

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: ApplicationData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    pub application: ApplicationSubmission,
    pub email_result: Delivery,
    pub db_result: DbResult,
    pub application_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbResult {
    pub success: bool,
    pub application_id: Uuid,
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub estimated_monthly_income: u64,
}

#[derive(Debug, Serialize)]
pub struct ApplicationProbe {
    pub message: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Submit a property application
///
/// POST /applications
pub async fn submit_application(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplicationResponse>)> {
    let payload = json_body(body, APPLICATION_VALIDATION_MESSAGE)?;

    let outcome = state
        .intake
        .submit_application(payload)
        .await
        .map_err(|e| e.masked(INTERNAL_ERROR_MESSAGE))?;

    let saved = outcome.saved;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            success: true,
            message: "Application submitted successfully!",
            data: ApplicationData {
                application: outcome.application,
                email_result: outcome.email,
                db_result: DbResult {
                    success: true,
                    application_id: saved.application_id,
                    property_id: saved.property_id,
                    owner_id: saved.owner_id,
                    estimated_monthly_income: saved.estimated_monthly_income,
                },
                application_id: saved.application_id,
            },
        }),
    ))
}

/// Liveness probe for the applications endpoint
///
/// GET /applications
pub async fn applications_info() -> Json<ApplicationProbe> {
    Json(ApplicationProbe {
        message: "Application API endpoint is working",
        timestamp: chrono::Utc::now(),
    })
}
