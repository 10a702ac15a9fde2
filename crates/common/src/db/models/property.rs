//! Property entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing status of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Submitted,
    Listed,
    Withdrawn,
}

impl From<String> for PropertyStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "listed" => PropertyStatus::Listed,
            "withdrawn" => PropertyStatus::Withdrawn,
            _ => PropertyStatus::Submitted,
        }
    }
}

impl From<PropertyStatus> for String {
    fn from(status: PropertyStatus) -> Self {
        match status {
            PropertyStatus::Submitted => "submitted".to_string(),
            PropertyStatus::Listed => "listed".to_string(),
            PropertyStatus::Withdrawn => "withdrawn".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub owner_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    // (owner_id, address, city, state, zip_code) is unique
    #[sea_orm(column_type = "Text")]
    pub address: String,

    #[sea_orm(column_type = "Text")]
    pub city: String,

    #[sea_orm(column_type = "Text")]
    pub state: String,

    #[sea_orm(column_type = "Text")]
    pub zip_code: String,

    #[sea_orm(column_type = "Text")]
    pub property_type: String,

    pub bedrooms: f64,

    pub bathrooms: f64,

    pub square_footage: Option<f64>,

    /// JSON array of amenity names
    #[sea_orm(column_type = "JsonBinary")]
    pub amenities: serde_json::Value,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// JSON array of photo references
    #[sea_orm(column_type = "JsonBinary")]
    pub photos: serde_json::Value,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn property_status(&self) -> PropertyStatus {
        PropertyStatus::from(self.status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property_owner::Entity",
        from = "Column::OwnerId",
        to = "super::property_owner::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
}

impl Related<super::property_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
