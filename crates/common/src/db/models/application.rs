//! Application entity: one lead-intake event per submission

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of an application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<String> for ApplicationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => "pending".to_string(),
            ApplicationStatus::Approved => "approved".to_string(),
            ApplicationStatus::Rejected => "rejected".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub property_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    /// Whole currency units, computed server-side
    pub estimated_monthly_income: i64,

    pub management_fee_percent: f64,

    /// Reserved for uploaded documents
    #[sea_orm(column_type = "JsonBinary")]
    pub documents: serde_json::Value,

    /// Answers without a dedicated column, kept for manual review
    #[sea_orm(column_type = "JsonBinary")]
    pub notes: serde_json::Value,

    pub submitted_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn application_status(&self) -> ApplicationStatus {
        ApplicationStatus::from(self.status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id"
    )]
    Property,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
