//! Postgres-backed [`LeadStore`]
//!
//! Owner and property rows are resolved by their natural keys with
//! `INSERT .. ON CONFLICT .. DO UPDATE .. RETURNING`, so concurrent
//! submissions for the same owner converge on one row each. The three
//! writes share a single transaction.

use crate::db::models::*;
use crate::db::records::{normalize_email, property_description, property_title, ApplicationNotes};
use crate::db::{DbPool, LeadStore, SavedApplication};
use crate::errors::Result;
use crate::validation::ApplicationSubmission;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, Set, TransactionTrait};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Repository for lead persistence
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    // ========================================================================
    // Owner
    // ========================================================================

    async fn upsert_owner(
        &self,
        txn: &DatabaseTransaction,
        submission: &ApplicationSubmission,
    ) -> Result<PropertyOwner> {
        let now = chrono::Utc::now();

        let owner = PropertyOwnerActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&submission.email)),
            first_name: Set(submission.first_name.clone()),
            last_name: Set(submission.last_name.clone()),
            phone: Set(submission.phone.clone()),
            status: Set(OwnerStatus::Active.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let owner = PropertyOwnerEntity::insert(owner)
            .on_conflict(
                OnConflict::column(PropertyOwnerColumn::Email)
                    .update_columns([
                        PropertyOwnerColumn::FirstName,
                        PropertyOwnerColumn::LastName,
                        PropertyOwnerColumn::Phone,
                        PropertyOwnerColumn::Status,
                        PropertyOwnerColumn::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(txn)
            .await?;

        debug!(owner_id = %owner.id, "Owner resolved");
        Ok(owner)
    }

    // ========================================================================
    // Property
    // ========================================================================

    async fn upsert_property(
        &self,
        txn: &DatabaseTransaction,
        owner_id: Uuid,
        submission: &ApplicationSubmission,
    ) -> Result<Property> {
        let now = chrono::Utc::now();

        let property = PropertyActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            title: Set(property_title(submission)),
            address: Set(submission.address.clone()),
            city: Set(submission.city.clone()),
            state: Set(submission.state.clone()),
            zip_code: Set(submission.zip_code.clone()),
            property_type: Set(submission.property_type.clone()),
            bedrooms: Set(submission.bedrooms),
            bathrooms: Set(submission.bathrooms),
            square_footage: Set(submission.square_footage),
            amenities: Set(json!(submission.amenities)),
            description: Set(property_description(submission)),
            photos: Set(json!([])),
            status: Set(PropertyStatus::Submitted.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        // Photos are managed elsewhere and survive re-submission
        let property = PropertyEntity::insert(property)
            .on_conflict(
                OnConflict::columns([
                    PropertyColumn::OwnerId,
                    PropertyColumn::Address,
                    PropertyColumn::City,
                    PropertyColumn::State,
                    PropertyColumn::ZipCode,
                ])
                .update_columns([
                    PropertyColumn::Title,
                    PropertyColumn::PropertyType,
                    PropertyColumn::Bedrooms,
                    PropertyColumn::Bathrooms,
                    PropertyColumn::SquareFootage,
                    PropertyColumn::Amenities,
                    PropertyColumn::Description,
                    PropertyColumn::Status,
                    PropertyColumn::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_with_returning(txn)
            .await?;

        debug!(property_id = %property.id, "Property resolved");
        Ok(property)
    }

    // ========================================================================
    // Application
    // ========================================================================

    async fn insert_application(
        &self,
        txn: &DatabaseTransaction,
        property_id: Uuid,
        submission: &ApplicationSubmission,
        estimated_monthly_income: u64,
        management_fee_percent: f64,
    ) -> Result<Application> {
        let now = chrono::Utc::now();
        let notes = serde_json::to_value(ApplicationNotes::from(submission))?;

        let application = ApplicationActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(property_id),
            status: Set(ApplicationStatus::Pending.into()),
            estimated_monthly_income: Set(i64::try_from(estimated_monthly_income).unwrap_or(i64::MAX)),
            management_fee_percent: Set(management_fee_percent),
            documents: Set(json!([])),
            notes: Set(notes),
            submitted_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        application.insert(txn).await.map_err(Into::into)
    }
}

#[async_trait]
impl LeadStore for Repository {
    #[instrument(skip_all, fields(property_type = %submission.property_type))]
    async fn save_application(
        &self,
        submission: &ApplicationSubmission,
        estimated_monthly_income: u64,
        management_fee_percent: f64,
    ) -> Result<SavedApplication> {
        // Dropping the transaction on any early return rolls it back
        let txn = self.pool.conn().begin().await?;

        let owner = self.upsert_owner(&txn, submission).await?;
        let property = self.upsert_property(&txn, owner.id, submission).await?;
        let application = self
            .insert_application(
                &txn,
                property.id,
                submission,
                estimated_monthly_income,
                management_fee_percent,
            )
            .await?;

        txn.commit().await?;

        info!(
            application_id = %application.id,
            property_id = %property.id,
            owner_id = %owner.id,
            estimated_monthly_income,
            "Application persisted"
        );

        Ok(SavedApplication {
            application_id: application.id,
            property_id: property.id,
            owner_id: owner.id,
            estimated_monthly_income,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
