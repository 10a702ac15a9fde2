//! Property owner entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Owner account status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStatus {
    Active,
    Inactive,
}

impl From<String> for OwnerStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "inactive" => OwnerStatus::Inactive,
            _ => OwnerStatus::Active,
        }
    }
}

impl From<OwnerStatus> for String {
    fn from(status: OwnerStatus) -> Self {
        match status {
            OwnerStatus::Active => "active".to_string(),
            OwnerStatus::Inactive => "inactive".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_owners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Natural key
    #[sea_orm(column_type = "Text", unique)]
    pub email: String,

    #[sea_orm(column_type = "Text")]
    pub first_name: String,

    #[sea_orm(column_type = "Text")]
    pub last_name: String,

    #[sea_orm(column_type = "Text")]
    pub phone: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn owner_status(&self) -> OwnerStatus {
        OwnerStatus::from(self.status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property::Entity")]
    Properties,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
