//! Interactive income estimate

use axum::{
    extract::rejection::JsonRejection,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::handlers::json_body;
use leadforge_common::{
    errors::{AppError, Result},
    estimate::{self, IncomeEstimate, PropertyProfile},
    validation::parse_payload,
};

const ESTIMATE_VALIDATION_MESSAGE: &str = "Validation error";

/// Request for an income estimate
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(default)]
    pub property_type: String,

    #[validate(
        required(message = "Bedrooms is required"),
        range(min = 0.0, message = "Bedrooms must be 0 or more")
    )]
    pub bedrooms: Option<f64>,

    #[validate(
        required(message = "Bathrooms is required"),
        range(min = 0.0, message = "Bathrooms must be 0 or more")
    )]
    pub bathrooms: Option<f64>,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub amenities: Vec<String>,

    #[serde(default)]
    pub furnished: bool,
}

/// Estimate short-term rental income for a property
///
/// POST /estimate
pub async fn estimate_income(
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<IncomeEstimate>> {
    let payload = json_body(body, ESTIMATE_VALIDATION_MESSAGE)?;
    let request: EstimateRequest = parse_payload(payload)
        .map_err(|errors| AppError::validation(ESTIMATE_VALIDATION_MESSAGE, errors))?;

    let result = estimate::estimate(&PropertyProfile {
        property_type: &request.property_type,
        bedrooms: request.bedrooms.unwrap_or_default(),
        bathrooms: request.bathrooms.unwrap_or_default(),
        amenity_count: request.amenities.len(),
        furnished: request.furnished,
        city: &request.city,
    });

    tracing::debug!(
        property_type = %request.property_type,
        monthly_income = result.monthly_income,
        "Estimate computed"
    );

    Ok(Json(result))
}
