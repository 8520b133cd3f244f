//! Payment entity - One money receipt recorded against a purchase order.
//!
//! Only payments in the `completed` state count towards their order's `amount_paid`.
//! Payments are soft-deleted so that their history is preserved.

use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Funds were received; counts towards the order balance
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
    #[sea_orm(string_value = "voided")]
    Voided,
}

impl PaymentStatus {
    /// Whether a payment in this state contributes to its order's `amount_paid`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// How the money was received.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "mobile_money")]
    MobileMoney,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this payment is applied to; may be reassigned on edit
    pub purchase_order_id: i64,
    /// Customer of the order, kept in step with `purchase_order_id`
    pub customer_id: i64,
    /// User who recorded the payment
    pub user_id: i64,
    /// Human-facing number, e.g. `PAY-20250315-0003`
    #[sea_orm(unique)]
    pub payment_number: String,
    pub amount_paid: Amount,
    pub payment_date: Date,
    pub payment_method: PaymentMethod,
    /// Check number, bank reference, etc.
    pub reference_number: Option<String>,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    /// The order's balance due right after this payment was reconciled. Informational only.
    pub remaining_balance: Amount,
    /// Provider-side transaction id for electronic payments
    pub transaction_id: Option<String>,
    /// Bank name, mobile money provider, etc.
    pub payment_provider: Option<String>,
    pub account_code: Option<String>,
    pub tax_receipt_number: Option<String>,
    /// Soft delete flag - if true, payment no longer counts and is hidden
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one order
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    /// Each payment belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
