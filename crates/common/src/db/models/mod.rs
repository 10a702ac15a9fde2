//! SeaORM entity models
//!
//! Database entities for LeadForge

mod application;
mod property;
mod property_owner;

pub use property_owner::{
    Entity as PropertyOwnerEntity,
    Model as PropertyOwner,
    ActiveModel as PropertyOwnerActiveModel,
    Column as PropertyOwnerColumn,
    OwnerStatus,
};

pub use property::{
    Entity as PropertyEntity,
    Model as Property,
    ActiveModel as PropertyActiveModel,
    Column as PropertyColumn,
    PropertyStatus,
};

pub use application::{
    Entity as ApplicationEntity,
    Model as Application,
    ActiveModel as ApplicationActiveModel,
    Column as ApplicationColumn,
    ApplicationStatus,
};
