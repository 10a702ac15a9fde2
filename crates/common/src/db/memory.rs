//! In-process [`LeadStore`] used when no database URL is configured

use crate::db::models::{
    Application, ApplicationStatus, OwnerStatus, Property, PropertyOwner, PropertyStatus,
};
use crate::db::records::{normalize_email, property_description, property_title, ApplicationNotes};
use crate::db::{LeadStore, SavedApplication};
use crate::errors::Result;
use crate::validation::ApplicationSubmission;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct MemorySnapshot {
    pub owners: Vec<PropertyOwner>,
    pub properties: Vec<Property>,
    pub applications: Vec<Application>,
}

/// Tables behind one lock so each save is atomic
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemorySnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemorySnapshot {
        self.tables.lock().await.clone()
    }
}

fn same_address(property: &Property, owner_id: Uuid, s: &ApplicationSubmission) -> bool {
    property.owner_id == owner_id
        && property.address == s.address
        && property.city == s.city
        && property.state == s.state
        && property.zip_code == s.zip_code
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn save_application(
        &self,
        submission: &ApplicationSubmission,
        estimated_monthly_income: u64,
        management_fee_percent: f64,
    ) -> Result<SavedApplication> {
        // Serialize first so a failure leaves the tables untouched
        let notes = serde_json::to_value(ApplicationNotes::from(submission))?;
        let now = chrono::Utc::now();
        let email = normalize_email(&submission.email);

        let mut tables = self.tables.lock().await;

        let owner_id = match tables.owners.iter_mut().find(|o| o.email == email) {
            Some(owner) => {
                owner.first_name = submission.first_name.clone();
                owner.last_name = submission.last_name.clone();
                owner.phone = submission.phone.clone();
                owner.status = OwnerStatus::Active.into();
                owner.updated_at = now.into();
                owner.id
            }
            None => {
                let id = Uuid::new_v4();
                tables.owners.push(PropertyOwner {
                    id,
                    email,
                    first_name: submission.first_name.clone(),
                    last_name: submission.last_name.clone(),
                    phone: submission.phone.clone(),
                    status: OwnerStatus::Active.into(),
                    created_at: now.into(),
                    updated_at: now.into(),
                });
                id
            }
        };

        let property_id = match tables
            .properties
            .iter_mut()
            .find(|p| same_address(p, owner_id, submission))
        {
            Some(property) => {
                property.title = property_title(submission);
                property.property_type = submission.property_type.clone();
                property.bedrooms = submission.bedrooms;
                property.bathrooms = submission.bathrooms;
                property.square_footage = submission.square_footage;
                property.amenities = json!(submission.amenities);
                property.description = property_description(submission);
                property.status = PropertyStatus::Submitted.into();
                property.updated_at = now.into();
                property.id
            }
            None => {
                let id = Uuid::new_v4();
                tables.properties.push(Property {
                    id,
                    owner_id,
                    title: property_title(submission),
                    address: submission.address.clone(),
                    city: submission.city.clone(),
                    state: submission.state.clone(),
                    zip_code: submission.zip_code.clone(),
                    property_type: submission.property_type.clone(),
                    bedrooms: submission.bedrooms,
                    bathrooms: submission.bathrooms,
                    square_footage: submission.square_footage,
                    amenities: json!(submission.amenities),
                    description: property_description(submission),
                    photos: json!([]),
                    status: PropertyStatus::Submitted.into(),
                    created_at: now.into(),
                    updated_at: now.into(),
                });
                id
            }
        };

        let application_id = Uuid::new_v4();
        tables.applications.push(Application {
            id: application_id,
            property_id,
            status: ApplicationStatus::Pending.into(),
            estimated_monthly_income: i64::try_from(estimated_monthly_income).unwrap_or(i64::MAX),
            management_fee_percent,
            documents: json!([]),
            notes,
            submitted_at: now.into(),
            updated_at: now.into(),
        });

        Ok(SavedApplication {
            application_id,
            property_id,
            owner_id,
            estimated_monthly_income,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{parse_application, valid_payload};

    #[tokio::test]
    async fn test_resubmission_reuses_owner_and_property() {
        let store = MemoryStore::new();
        let submission = parse_application(valid_payload()).unwrap();

        let first = store.save_application(&submission, 4500, 20.0).await.unwrap();
        let second = store.save_application(&submission, 4500, 20.0).await.unwrap();

        assert_eq!(first.owner_id, second.owner_id);
        assert_eq!(first.property_id, second.property_id);
        assert_ne!(first.application_id, second.application_id);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.owners.len(), 1);
        assert_eq!(snapshot.properties.len(), 1);
        assert_eq!(snapshot.applications.len(), 2);
    }

    #[tokio::test]
    async fn test_owner_matched_case_insensitively_and_updated() {
        let store = MemoryStore::new();
        let mut submission = parse_application(valid_payload()).unwrap();
        let first = store.save_application(&submission, 100, 20.0).await.unwrap();

        submission.email = "DANA@example.com ".into();
        submission.phone = "2105550000".into();
        let second = store.save_application(&submission, 100, 20.0).await.unwrap();
        assert_eq!(first.owner_id, second.owner_id);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.owners[0].phone, "2105550000");
        assert_eq!(snapshot.owners[0].email, "dana@example.com");
        assert_eq!(snapshot.owners[0].owner_status(), OwnerStatus::Active);
    }

    #[tokio::test]
    async fn test_new_address_creates_property() {
        let store = MemoryStore::new();
        let mut submission = parse_application(valid_payload()).unwrap();
        store.save_application(&submission, 100, 20.0).await.unwrap();

        submission.zip_code = "78255".into();
        store.save_application(&submission, 100, 20.0).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.owners.len(), 1);
        assert_eq!(snapshot.properties.len(), 2);
    }

    #[tokio::test]
    async fn test_application_row_contents() {
        let store = MemoryStore::new();
        let submission = parse_application(valid_payload()).unwrap();
        let saved = store.save_application(&submission, 3150, 20.0).await.unwrap();

        let snapshot = store.snapshot().await;
        let application = &snapshot.applications[0];
        assert_eq!(application.id, saved.application_id);
        assert_eq!(application.application_status(), ApplicationStatus::Pending);
        assert_eq!(application.estimated_monthly_income, 3150);
        assert_eq!(application.documents, json!([]));
        assert_eq!(application.notes["propertyFeatures"]["photosAvailable"], true);

        let property = &snapshot.properties[0];
        assert_eq!(property.property_status(), PropertyStatus::Submitted);
        assert_eq!(property.amenities, json!(["pool", "wifi"]));
    }
}
