//! Shared test utilities.
//!
//! This module provides helpers for setting up test databases and creating customers,
//! inventory, orders and payments with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        balance::{completed_total, derive_balance},
        line_items::ItemInput,
        money::Amount,
        payment::{self, NewPayment},
        purchase_order::{self, NewOrder},
    },
    entities::{self, Payment, PaymentMethod, PaymentStatus, PurchaseOrder},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed order and payment date used by tests.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
}

/// Creates a customer with the given first name and last name "Tester".
pub async fn create_test_customer(
    db: &DatabaseConnection,
    first_name: &str,
) -> Result<entities::customer::Model> {
    let now = Utc::now().naive_utc();
    entities::customer::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set("Tester".to_string()),
        company_name: Set(None),
        email: Set(Some(format!("{}@example.com", first_name.to_lowercase()))),
        phone: Set(None),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an inventory item with custom packaging and selling price.
pub async fn create_custom_inventory(
    db: &DatabaseConnection,
    name: &str,
    packaging_type: Option<&str>,
    selling_price: Amount,
) -> Result<entities::inventory::Model> {
    let now = Utc::now().naive_utc();
    entities::inventory::ActiveModel {
        name: Set(name.to_string()),
        packaging_type: Set(packaging_type.map(str::to_string)),
        quantity: Set(100),
        cost_price: Set(Amount::ZERO),
        selling_price: Set(selling_price),
        status: Set("active".to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an inventory item sold by the piece for 10.00.
pub async fn create_test_inventory(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::inventory::Model> {
    create_custom_inventory(db, name, None, Amount::from_units(10)).await
}

/// A new order with one untaxed, undiscounted line whose total is `total`.
///
/// # Defaults
/// * `po_number`: generated
/// * `user_id`: 1
/// * `order_date`: [`test_date`]
/// * line: quantity 1, unit "pcs", unit price `total`
pub fn sample_new_order(customer_id: i64, inventory_id: i64, total: Amount) -> NewOrder {
    NewOrder {
        po_number: None,
        customer_id,
        user_id: 1,
        order_date: test_date(),
        payment_terms: None,
        shipping_cost: Amount::ZERO,
        discount_amount: Amount::ZERO,
        items: vec![ItemInput::new(
            inventory_id,
            Amount::from_units(1),
            "pcs",
            total,
        )],
    }
}

/// Creates an order for an existing customer with a fresh inventory item.
pub async fn create_test_order(
    db: &DatabaseConnection,
    customer_id: i64,
    total: Amount,
) -> Result<entities::purchase_order::Model> {
    let stock = create_test_inventory(db, "Test Stock").await?;
    purchase_order::create_order(db, sample_new_order(customer_id, stock.id, total)).await
}

/// Sets up a database holding one customer and one unpaid order of `total`.
/// Returns (db, order) for common test scenarios.
pub async fn setup_with_order(
    total: Amount,
) -> Result<(DatabaseConnection, entities::purchase_order::Model)> {
    let db = setup_test_db().await?;
    let customer = create_test_customer(&db, "Test").await?;
    let order = create_test_order(&db, customer.id, total).await?;
    Ok((db, order))
}

/// Records a completed cash payment against an order.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    order_id: i64,
    amount: Amount,
) -> Result<entities::payment::Model> {
    payment::create_payment(
        db,
        NewPayment::new(order_id, 1, amount, test_date(), PaymentMethod::Cash),
    )
    .await
}

/// An unsaved payment row for pure tests.
pub fn sample_payment(id: i64, amount: Amount, status: PaymentStatus) -> entities::payment::Model {
    let now = test_date().and_hms_opt(12, 0, 0).unwrap();
    entities::payment::Model {
        id,
        purchase_order_id: 1,
        customer_id: 1,
        user_id: 1,
        payment_number: format!("PAY-20250315-{id:04}"),
        amount_paid: amount,
        payment_date: test_date(),
        payment_method: PaymentMethod::Cash,
        reference_number: None,
        status,
        notes: None,
        remaining_balance: Amount::ZERO,
        transaction_id: None,
        payment_provider: None,
        account_code: None,
        tax_receipt_number: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

/// Asserts that an order's stored balance matches its payments.
pub async fn assert_invariants(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let order = PurchaseOrder::find_by_id(order_id).one(db).await?.unwrap();
    let payments = Payment::find()
        .filter(entities::payment::Column::PurchaseOrderId.eq(order_id))
        .all(db)
        .await?;

    let paid = completed_total(&payments);
    let (due, status) = derive_balance(order.total_amount, paid);
    assert_eq!(order.amount_paid, paid, "amount_paid of order {order_id}");
    assert_eq!(order.balance_due, due, "balance_due of order {order_id}");
    assert_eq!(order.payment_status, status, "payment_status of order {order_id}");
    assert!(!order.balance_due.is_negative());
    Ok(())
}
