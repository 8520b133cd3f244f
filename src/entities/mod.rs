//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod customer;
pub mod inventory;
pub mod number_sequence;
pub mod payment;
pub mod purchase_order;
pub mod purchase_order_item;

// Re-export specific types to avoid conflicts
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use inventory::{Column as InventoryColumn, Entity as Inventory, Model as InventoryModel};
pub use number_sequence::{
    Column as NumberSequenceColumn, Entity as NumberSequence, Model as NumberSequenceModel,
};
pub use payment::{
    Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentMethod,
    PaymentStatus,
};
pub use purchase_order::{
    Column as PurchaseOrderColumn, Entity as PurchaseOrder, Model as PurchaseOrderModel,
    OrderPaymentStatus,
};
pub use purchase_order_item::{
    Column as PurchaseOrderItemColumn, Entity as PurchaseOrderItem,
    Model as PurchaseOrderItemModel,
};
