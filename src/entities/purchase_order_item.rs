//! Purchase order item entity - One purchased line on an order.
//!
//! Lines are owned by their order: they are inserted, updated and removed only through
//! the order lifecycle, and are hard-deleted with the order.

use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase order line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_id: i64,
    pub inventory_id: i64,
    /// Quantity with two decimal places (e.g. 2.50 kg)
    pub quantity: Amount,
    /// Unit label (e.g., "pcs", "kg", "crate")
    pub unit: String,
    pub unit_price: Amount,
    /// Tax percentage, e.g. `16.00`
    pub tax_rate: Amount,
    pub tax_amount: Amount,
    /// Discount percentage, e.g. `5.00`
    pub discount_rate: Amount,
    pub discount_amount: Amount,
    /// `quantity * unit_price`
    pub subtotal: Amount,
    /// `subtotal + tax_amount - discount_amount`
    pub total: Amount,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Defines relationships between `PurchaseOrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    /// Each line refers to one inventory item
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InventoryId",
        to = "super::inventory::Column::Id"
    )]
    Inventory,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
