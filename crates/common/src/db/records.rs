//! Derived columns written alongside a submission

use serde::{Deserialize, Serialize};

use crate::validation::ApplicationSubmission;

/// Lowercased, trimmed email used as the owner's natural key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn property_title(submission: &ApplicationSubmission) -> String {
    format!(
        "{} in {}, {}",
        submission.property_type, submission.city, submission.state
    )
}

pub fn property_description(submission: &ApplicationSubmission) -> String {
    format!(
        "{} with {} bed(s) and {} bath(s). {}. Property condition: {}.",
        submission.property_type,
        submission.bedrooms,
        submission.bathrooms,
        if submission.furnished { "Furnished" } else { "Unfurnished" },
        submission
            .property_condition
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Not specified"),
    )
}

/// Answers without a dedicated column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationNotes {
    pub current_situation: CurrentSituation,
    pub goals_and_expectations: GoalsAndExpectations,
    pub property_features: PropertyFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSituation {
    pub currently_listed: bool,
    pub listing_duration: Option<String>,
    pub current_rent: Option<f64>,
    pub vacancy_months: Option<String>,
    pub reason_for_vacancy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsAndExpectations {
    pub target_income: Option<String>,
    pub timeline: Option<String>,
    pub concerns: Vec<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFeatures {
    pub year_built: i32,
    pub property_condition: Option<String>,
    pub photos_available: bool,
    pub access_notes: Option<String>,
}

impl From<&ApplicationSubmission> for ApplicationNotes {
    fn from(s: &ApplicationSubmission) -> Self {
        Self {
            current_situation: CurrentSituation {
                currently_listed: s.currently_listed,
                listing_duration: s.listing_duration.clone(),
                current_rent: s.current_rent,
                vacancy_months: s.vacancy_months.clone(),
                reason_for_vacancy: s.reason_for_vacancy.clone(),
            },
            goals_and_expectations: GoalsAndExpectations {
                target_income: s.target_income.clone(),
                timeline: s.timeline.clone(),
                concerns: s.concerns.clone(),
                additional_info: s.additional_info.clone(),
            },
            property_features: PropertyFeatures {
                year_built: s.year_built,
                property_condition: s.property_condition.clone(),
                photos_available: s.photos_available,
                access_notes: s.access_notes.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse_application;
    use crate::validation::valid_payload;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dana@Example.COM "), "dana@example.com");
    }

    #[test]
    fn test_title_and_description() {
        let mut submission = parse_application(valid_payload()).unwrap();
        assert_eq!(property_title(&submission), "house in San Antonio, TX");
        assert_eq!(
            property_description(&submission),
            "house with 3 bed(s) and 2 bath(s). Furnished. Property condition: Not specified."
        );

        submission.bathrooms = 2.5;
        submission.furnished = false;
        submission.property_condition = Some("excellent".into());
        assert_eq!(
            property_description(&submission),
            "house with 3 bed(s) and 2.5 bath(s). Unfurnished. Property condition: excellent."
        );
    }

    #[test]
    fn test_notes_layout() {
        let submission = parse_application(valid_payload()).unwrap();
        let notes = serde_json::to_value(ApplicationNotes::from(&submission)).unwrap();

        assert_eq!(notes["currentSituation"]["currentlyListed"], false);
        assert_eq!(notes["goalsAndExpectations"]["timeline"], "Within 30 days");
        assert_eq!(notes["goalsAndExpectations"]["concerns"][0], "guest damage");
        assert_eq!(notes["propertyFeatures"]["yearBuilt"], 2004);
    }
}
