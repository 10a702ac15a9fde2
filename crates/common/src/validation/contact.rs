//! Contact form schema

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{parse_payload, text_or_number};
use crate::errors::FieldError;

/// A general inquiry from the contact form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<String>,

    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactSubmission {
    /// Whether any property detail was supplied alongside the message
    pub fn has_property_details(&self) -> bool {
        [&self.property_type, &self.bedrooms, &self.bathrooms, &self.address]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Decode and validate a contact form payload
pub fn parse_contact(payload: serde_json::Value) -> Result<ContactSubmission, Vec<FieldError>> {
    parse_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_contact() {
        let contact = parse_contact(json!({
            "name": "Maria Lopez",
            "email": "maria@example.com",
            "message": "I own a duplex near downtown and want to list it.",
            "bedrooms": 3,
            "bathrooms": "2"
        }))
        .unwrap();

        assert_eq!(contact.bedrooms.as_deref(), Some("3"));
        assert_eq!(contact.bathrooms.as_deref(), Some("2"));
        assert!(contact.has_property_details());
    }

    #[test]
    fn test_two_character_name_passes_short_message_fails() {
        let errors = parse_contact(json!({
            "name": "Jo",
            "email": "jo@x.com",
            "message": "short"
        }))
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "message");
        assert_eq!(errors[0].message, "Message must be at least 10 characters");
    }

    #[test]
    fn test_every_violation_is_reported() {
        let errors = parse_contact(json!({
            "name": "J",
            "email": "not-an-email",
            "message": "hi"
        }))
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "message", "name"]);
    }

    #[test]
    fn test_missing_fields_report_constraints() {
        let errors = parse_contact(json!({})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "name"
            && e.message == "Name must be at least 2 characters"));
    }

    #[test]
    fn test_no_property_details() {
        let contact = parse_contact(json!({
            "name": "Sam",
            "email": "sam@example.com",
            "message": "Please call me about your services.",
            "address": "   "
        }))
        .unwrap();
        assert!(!contact.has_property_details());
    }
}
