//! Inventory entity - Stock items that purchase order lines refer to.
//!
//! Only read by this crate: an inventory row supplies the default unit label and
//! unit price when a new line is added to an order.

use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventories")]
pub struct Model {
    /// Unique identifier for the inventory item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Mineral Water 500ml")
    pub name: String,
    /// Packaging label used as the default line unit (e.g., "crate", "carton")
    pub packaging_type: Option<String>,
    /// Units currently in stock
    pub quantity: i64,
    /// Purchase cost, zero when not recorded
    pub cost_price: Amount,
    /// Default unit price for new order lines, zero when not recorded
    pub selling_price: Amount,
    /// `"active"`, `"inactive"` or `"discontinued"`
    pub status: String,
    /// Soft delete flag - if true, item is hidden but data is preserved
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Defines relationships between Inventory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One inventory item appears on many order lines
    #[sea_orm(has_many = "super::purchase_order_item::Entity")]
    PurchaseOrderItems,
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
