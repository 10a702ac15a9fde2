//! Property application schema
//!
//! [`ApplicationForm`] mirrors the wizard payload with every required field
//! optional so that missing values are reported alongside every other
//! violation. Once validated it converts into [`ApplicationSubmission`],
//! where required fields are plain values.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::parse_payload;
use crate::errors::FieldError;

/// Oldest accepted construction year
pub const EARLIEST_YEAR_BUILT: i32 = 1800;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    // Owner
    #[serde(default)]
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 10, message = "Phone number must be at least 10 characters"))]
    pub phone: String,

    // Property
    #[serde(default)]
    #[validate(length(min = 1, message = "Property type is required"))]
    pub property_type: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Address is required"))]
    pub address: String,

    #[serde(default)]
    #[validate(length(min = 2, message = "City is required"))]
    pub city: String,

    #[serde(default)]
    #[validate(length(min = 2, message = "State is required"))]
    pub state: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "ZIP code is required"))]
    pub zip_code: String,

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

    #[validate(range(min = 0.0, message = "Square footage must be 0 or more"))]
    pub square_footage: Option<f64>,

    #[validate(
        required(message = "Year built is required"),
        custom(function = "validate_year_built")
    )]
    pub year_built: Option<i32>,

    // Current situation
    #[validate(required(message = "Currently listed is required"))]
    pub currently_listed: Option<bool>,

    pub listing_duration: Option<String>,

    #[validate(range(min = 0.0, message = "Current rent must be 0 or more"))]
    pub current_rent: Option<f64>,

    pub vacancy_months: Option<String>,

    pub reason_for_vacancy: Option<String>,

    // Features
    #[validate(required(message = "Furnished is required"))]
    pub furnished: Option<bool>,

    pub amenities: Option<Vec<String>>,

    pub property_condition: Option<String>,

    #[validate(required(message = "Photos available is required"))]
    pub photos_available: Option<bool>,

    pub access_notes: Option<String>,

    // Goals
    pub target_income: Option<String>,

    pub timeline: Option<String>,

    pub concerns: Option<Vec<String>>,

    pub additional_info: Option<String>,
}

fn validate_year_built(year: i32) -> Result<(), ValidationError> {
    let message = if year < EARLIEST_YEAR_BUILT {
        "Year built must be valid"
    } else if year > Utc::now().year() {
        "Year built cannot be in the future"
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new("year_built");
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

/// A validated property application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,

    pub property_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub bedrooms: f64,
    pub bathrooms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square_footage: Option<f64>,
    pub year_built: i32,

    pub currently_listed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_rent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_months: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_for_vacancy: Option<String>,

    pub furnished: bool,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_condition: Option<String>,
    pub photos_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_income: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl ApplicationForm {
    /// Convert a form that already passed [`Validate::validate`]
    fn into_submission(self) -> ApplicationSubmission {
        ApplicationSubmission {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            property_type: self.property_type,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            bedrooms: self.bedrooms.unwrap_or_default(),
            bathrooms: self.bathrooms.unwrap_or_default(),
            square_footage: self.square_footage,
            year_built: self.year_built.unwrap_or(EARLIEST_YEAR_BUILT),
            currently_listed: self.currently_listed.unwrap_or_default(),
            listing_duration: self.listing_duration,
            current_rent: self.current_rent,
            vacancy_months: self.vacancy_months,
            reason_for_vacancy: self.reason_for_vacancy,
            furnished: self.furnished.unwrap_or_default(),
            amenities: self.amenities.unwrap_or_default(),
            property_condition: self.property_condition,
            photos_available: self.photos_available.unwrap_or_default(),
            access_notes: self.access_notes,
            target_income: self.target_income,
            timeline: self.timeline,
            concerns: self.concerns.unwrap_or_default(),
            additional_info: self.additional_info,
        }
    }
}

impl ApplicationSubmission {
    /// Full name as entered
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Single-line postal address
    pub fn full_address(&self) -> String {
        format!("{}, {}, {} {}", self.address, self.city, self.state, self.zip_code)
    }

    /// Inputs for the income estimator
    pub fn profile(&self) -> crate::estimate::PropertyProfile<'_> {
        crate::estimate::PropertyProfile {
            property_type: &self.property_type,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenity_count: self.amenities.len(),
            furnished: self.furnished,
            city: &self.city,
        }
    }
}

/// Decode and validate a property application payload
pub fn parse_application(
    payload: serde_json::Value,
) -> Result<ApplicationSubmission, Vec<FieldError>> {
    parse_payload::<ApplicationForm>(payload).map(ApplicationForm::into_submission)
}
