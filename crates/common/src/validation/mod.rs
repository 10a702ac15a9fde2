//! Input validation for lead submissions
//!
//! Payloads arrive as decoded JSON and leave either as a fully typed value
//! or as the complete list of violated fields. Nothing downstream ever sees
//! a partially valid submission.

mod application;
mod contact;

pub use application::{parse_application, ApplicationForm, ApplicationSubmission};
pub use contact::{parse_contact, ContactSubmission};

#[cfg(test)]
pub(crate) use application::tests::valid_payload;

use crate::errors::FieldError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

/// Field reported when the body itself cannot be decoded
pub const BODY_FIELD: &str = "body";

/// Decode and validate a JSON payload
///
/// The body must be a JSON object. Every field of `T` must tolerate being
/// absent (`#[serde(default)]` or `Option`) so that a field with the wrong
/// JSON type can be reported on its own while the rest are still validated.
pub fn parse_payload<T>(mut payload: serde_json::Value) -> Result<T, Vec<FieldError>>
where
    T: DeserializeOwned + Validate,
{
    if !payload.is_object() {
        return Err(vec![FieldError::new(
            BODY_FIELD,
            "Request body must be a JSON object",
        )]);
    }

    let mut mistyped = Vec::new();
    let value = match T::deserialize(&payload) {
        Ok(value) => value,
        Err(_) => {
            if let Some(fields) = payload.as_object_mut() {
                mistyped = mistyped_fields::<T>(fields);
                for error in &mistyped {
                    fields.remove(&error.field);
                }
            }
            T::deserialize(&payload).map_err(|e| {
                vec![FieldError::new(BODY_FIELD, format!("Invalid request body: {}", e))]
            })?
        }
    };

    let mut errors = match value.validate() {
        Ok(()) => Vec::new(),
        Err(e) => collect_field_errors(&e),
    };
    if errors.is_empty() && mistyped.is_empty() {
        return Ok(value);
    }

    // A mistyped field was dropped before validation; keep its type error only
    errors.retain(|e| !mistyped.iter().any(|m| m.field == e.field));
    errors.extend(mistyped);
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(errors)
}

/// Fields whose JSON value does not decode into the type `T` declares
fn mistyped_fields<T>(fields: &serde_json::Map<String, serde_json::Value>) -> Vec<FieldError>
where
    T: DeserializeOwned,
{
    fields
        .iter()
        .filter_map(|(name, value)| {
            let mut single = serde_json::Map::new();
            single.insert(name.clone(), value.clone());
            T::deserialize(&serde_json::Value::Object(single))
                .err()
                .map(|e| FieldError::new(name.as_str(), format!("Invalid value: {}", e)))
        })
        .collect()
}

/// Flatten validator output into one entry per violated field, ordered by field
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .filter_map(|(field, violations)| {
            let field = camel_case(field);
            violations.first().map(|violation| {
                let message = violation
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldError::new(field, message)
            })
        })
        .collect();

    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// `zip_code` -> `zipCode`, matching the wire names clients send
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Free-text fields that some forms send as numbers (`"bedrooms": 2`)
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected a string or number",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("zip_code"), "zipCode");
        assert_eq!(camel_case("year_built"), "yearBuilt");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn test_non_object_body_is_single_error() {
        for body in [
            json!(["not", "an", "object"]),
            json!(["Jonathan", "jo@example.com", null, "Please send me a quote for my condo"]),
            json!("Jonathan"),
            json!(null),
        ] {
            let errors = parse_contact(body.clone()).unwrap_err();
            assert_eq!(errors.len(), 1, "{}", body);
            assert_eq!(errors[0].field, BODY_FIELD);
        }
    }

    #[test]
    fn test_type_error_reported_with_other_violations() {
        let mut payload = valid_payload();
        payload["firstName"] = json!("J");
        payload["phone"] = json!("123");
        payload["bedrooms"] = json!("three");

        let errors = parse_application(payload).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["bedrooms", "firstName", "phone"]);
        assert!(errors[0].message.starts_with("Invalid value:"));
        assert_eq!(errors[1].message, "First name must be at least 2 characters");
    }

    #[test]
    fn test_each_mistyped_field_reported() {
        let errors = parse_contact(json!({
            "name": 42,
            "email": ["jo@example.com"],
            "message": "Looking for a management quote."
        }))
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
    }
}
