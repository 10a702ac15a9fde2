//! API handlers module

pub mod applications;
pub mod contact;
pub mod estimate;
pub mod health;

use axum::{extract::rejection::JsonRejection, Json};
use leadforge_common::{
    errors::{AppError, FieldError},
    validation::BODY_FIELD,
};
use serde_json::Value;

/// Turn a body that is not JSON into a single `body` field error
pub(crate) fn json_body(
    body: Result<Json<Value>, JsonRejection>,
    message: &'static str,
) -> Result<Value, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        AppError::validation(message, vec![FieldError::new(BODY_FIELD, rejection.body_text())])
    })
}
