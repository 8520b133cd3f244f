//! Customer entity - The buyer referenced by purchase orders and payments.
//!
//! Customer management itself lives outside this crate; the table is kept so that
//! orders and payments have a real foreign key target to validate against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Trading name, if the customer is a business
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Soft delete flag - if true, customer is hidden but data is preserved
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many purchase orders
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
    /// One customer has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
