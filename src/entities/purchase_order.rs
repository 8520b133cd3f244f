//! Purchase order entity - The aggregate root for order lines and payments.
//!
//! Totals are always derived from the order's items plus its explicit shipping cost and
//! discount. `amount_paid`, `balance_due` and `payment_status` are derived from the order's
//! completed payments and are rewritten by the balance engine after every change.

use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How much of an order has been paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// Purchase order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing order number, e.g. `PO-20250315-0001`
    #[sea_orm(unique)]
    pub po_number: String,
    /// User who created the order
    pub user_id: i64,
    pub customer_id: i64,
    pub order_date: Date,
    /// Free-text terms such as "Net 30"
    pub payment_terms: Option<String>,
    /// Sum of line subtotals
    pub subtotal: Amount,
    /// Sum of line tax amounts
    pub tax_amount: Amount,
    pub shipping_cost: Amount,
    /// Sum of line discount amounts
    pub discount_amount: Amount,
    /// `subtotal + tax_amount + shipping_cost - discount_amount`
    pub total_amount: Amount,
    /// Sum of the order's completed, non-deleted payments
    pub amount_paid: Amount,
    /// `max(0, total_amount - amount_paid)`
    pub balance_due: Amount,
    pub payment_status: OrderPaymentStatus,
    /// Soft delete flag - if true, order is hidden but data is preserved
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Defines relationships between `PurchaseOrder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One order has many lines
    #[sea_orm(has_many = "super::purchase_order_item::Entity")]
    Items,
    /// One order has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
