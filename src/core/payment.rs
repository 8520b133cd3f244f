//! Payment reconciliation workflow.
//!
//! Records, edits and deletes payments, and re-derives the balance of every order a change
//! touches. Each operation is one transaction: the payment write and the order balance
//! update commit together or not at all.
//!
//! Only `completed` payments count towards an order. After every operation an order's
//! `amount_paid` equals the sum of its completed, non-deleted payments; this holds because
//! the balance engine recomputes that sum rather than adjusting a running total.

use crate::{
    core::{balance::refresh_order_balance, money::Amount, numbering},
    entities::{
        Payment, PaymentMethod, PaymentStatus, PurchaseOrder, payment, purchase_order,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A new payment as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub purchase_order_id: i64,
    /// User recording the payment
    pub user_id: i64,
    pub amount_paid: Amount,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    /// Defaults to `completed`
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub tax_receipt_number: Option<String>,
}

impl NewPayment {
    /// A completed payment with no reference metadata.
    #[must_use]
    pub const fn new(
        purchase_order_id: i64,
        user_id: i64,
        amount_paid: Amount,
        payment_date: NaiveDate,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            purchase_order_id,
            user_id,
            amount_paid,
            payment_date,
            payment_method,
            status: None,
            reference_number: None,
            transaction_id: None,
            payment_provider: None,
            notes: None,
            account_code: None,
            tax_receipt_number: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Changes to an existing payment. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    /// Move the payment to another order
    #[serde(default)]
    pub purchase_order_id: Option<i64>,
    #[serde(default)]
    pub amount_paid: Option<Amount>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub tax_receipt_number: Option<String>,
}

fn validate_amount(amount: Amount) -> Result<()> {
    if !amount.is_positive() {
        return Err(Error::validation(
            "amount_paid",
            format!("must be greater than zero, got {amount}"),
        ));
    }
    Ok(())
}

async fn find_active_order(txn: &DatabaseTransaction, order_id: i64) -> Result<purchase_order::Model> {
    PurchaseOrder::find_by_id(order_id)
        .one(txn)
        .await?
        .filter(|o| !o.is_deleted)
        .ok_or_else(|| Error::not_found("Purchase order", order_id))
}

async fn find_active_payment(txn: &DatabaseTransaction, payment_id: i64) -> Result<payment::Model> {
    Payment::find_by_id(payment_id)
        .one(txn)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("Payment", payment_id))
}

/// Records the order's balance due on the payment as an informational snapshot.
async fn stamp_remaining_balance(
    txn: &DatabaseTransaction,
    payment: payment::Model,
    order: &purchase_order::Model,
) -> Result<payment::Model> {
    let mut active: payment::ActiveModel = payment.into();
    active.remaining_balance = Set(order.balance_due);
    active.update(txn).await.map_err(Error::reconciliation)
}

/// Inserts a payment and reconciles its order inside the caller's transaction.
async fn record_payment(
    txn: &DatabaseTransaction,
    new: NewPayment,
) -> Result<(payment::Model, purchase_order::Model)> {
    validate_amount(new.amount_paid)?;
    let status = new.status.unwrap_or(PaymentStatus::Completed);

    let order = find_active_order(txn, new.purchase_order_id).await?;
    let payment_number = numbering::next_payment_number(txn, Utc::now().date_naive()).await?;

    let now = Utc::now().naive_utc();
    let payment = payment::ActiveModel {
        purchase_order_id: Set(order.id),
        customer_id: Set(order.customer_id),
        user_id: Set(new.user_id),
        payment_number: Set(payment_number),
        amount_paid: Set(new.amount_paid),
        payment_date: Set(new.payment_date),
        payment_method: Set(new.payment_method),
        reference_number: Set(new.reference_number),
        status: Set(status),
        notes: Set(new.notes),
        remaining_balance: Set(order.balance_due),
        transaction_id: Set(new.transaction_id),
        payment_provider: Set(new.payment_provider),
        account_code: Set(new.account_code),
        tax_receipt_number: Set(new.tax_receipt_number),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let order = refresh_order_balance(txn, order.id).await?;
    let payment = stamp_remaining_balance(txn, payment, &order).await?;
    Ok((payment, order))
}

fn log_recorded(payment: &payment::Model, order: &purchase_order::Model) {
    info!(
        payment_id = payment.id,
        payment_number = %payment.payment_number,
        order_id = order.id,
        amount = %payment.amount_paid,
        status = ?payment.status,
        balance_due = %order.balance_due,
        "Recorded payment"
    );
}

/// Records a payment against an order and reconciles the order's balance.
///
/// # Errors
/// - [`Error::Validation`] if the amount is not positive, before any database access
/// - [`Error::NotFound`] if the order does not exist or is deleted
/// - [`Error::Conflict`] if the generated payment number collides
/// - [`Error::Reconciliation`] if the order balance update fails
pub async fn create_payment(db: &DatabaseConnection, new: NewPayment) -> Result<payment::Model> {
    validate_amount(new.amount_paid)?;

    let txn = db.begin().await?;
    let (payment, order) = record_payment(&txn, new).await?;
    txn.commit().await?;

    log_recorded(&payment, &order);
    Ok(payment)
}

/// Edits a payment and reconciles every order it affects.
///
/// When the payment moves to another order, the old order is reconciled without it and the
/// new order with it; otherwise its own order is reconciled with the new amount and status.
///
/// # Errors
/// - [`Error::Validation`] if a new amount is not positive
/// - [`Error::NotFound`] if the payment or the target order does not exist or is deleted
/// - [`Error::Reconciliation`] if an order balance update fails
pub async fn update_payment(
    db: &DatabaseConnection,
    payment_id: i64,
    update: PaymentUpdate,
) -> Result<payment::Model> {
    if let Some(amount) = update.amount_paid {
        validate_amount(amount)?;
    }

    let txn = db.begin().await?;
    let existing = find_active_payment(&txn, payment_id).await?;
    let old_order_id = existing.purchase_order_id;
    let old_amount = existing.amount_paid;
    let old_status = existing.status;
    let new_order_id = update.purchase_order_id.unwrap_or(old_order_id);

    let mut active: payment::ActiveModel = existing.into();
    if new_order_id != old_order_id {
        let target = find_active_order(&txn, new_order_id).await?;
        active.purchase_order_id = Set(target.id);
        active.customer_id = Set(target.customer_id);
    }
    if let Some(amount) = update.amount_paid {
        active.amount_paid = Set(amount);
    }
    if let Some(status) = update.status {
        active.status = Set(status);
    }
    if let Some(date) = update.payment_date {
        active.payment_date = Set(date);
    }
    if let Some(method) = update.payment_method {
        active.payment_method = Set(method);
    }
    if let Some(reference) = update.reference_number {
        active.reference_number = Set(Some(reference));
    }
    if let Some(transaction_id) = update.transaction_id {
        active.transaction_id = Set(Some(transaction_id));
    }
    if let Some(provider) = update.payment_provider {
        active.payment_provider = Set(Some(provider));
    }
    if let Some(notes) = update.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(account_code) = update.account_code {
        active.account_code = Set(Some(account_code));
    }
    if let Some(receipt) = update.tax_receipt_number {
        active.tax_receipt_number = Set(Some(receipt));
    }
    active.updated_at = Set(Utc::now().naive_utc());
    let payment = active.update(&txn).await?;

    if new_order_id != old_order_id {
        refresh_order_balance(&txn, old_order_id).await?;
    }
    let order = refresh_order_balance(&txn, new_order_id).await?;
    let payment = stamp_remaining_balance(&txn, payment, &order).await?;

    txn.commit().await?;

    info!(
        payment_id,
        old_order_id,
        new_order_id,
        old_amount = %old_amount,
        new_amount = %payment.amount_paid,
        old_status = ?old_status,
        new_status = ?payment.status,
        "Updated payment"
    );
    Ok(payment)
}

/// Soft-deletes a payment and reconciles its order.
///
/// # Errors
/// - [`Error::NotFound`] if the payment does not exist or is already deleted
/// - [`Error::Reconciliation`] if the order balance update fails
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = find_active_payment(&txn, payment_id).await?;
    let order_id = existing.purchase_order_id;

    let mut active: payment::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now().naive_utc());
    let payment = active.update(&txn).await?;

    let order = refresh_order_balance(&txn, order_id).await?;
    txn.commit().await?;

    info!(
        payment_id,
        order_id,
        amount = %payment.amount_paid,
        status = ?payment.status,
        balance_due = %order.balance_due,
        "Deleted payment"
    );
    Ok(())
}

/// Pays off an order by recording a completed payment for its whole balance due.
///
/// The balance is re-derived and paid in the same transaction. Returns `None` when nothing
/// is due.
///
/// # Errors
/// Returns [`Error::NotFound`] if the order does not exist or is deleted, plus any error
/// of [`create_payment`].
pub async fn settle_order(
    db: &DatabaseConnection,
    order_id: i64,
    user_id: i64,
    payment_date: NaiveDate,
    payment_method: PaymentMethod,
) -> Result<Option<payment::Model>> {
    let txn = db.begin().await?;
    let order = refresh_order_balance(&txn, order_id).await?;

    if !order.balance_due.is_positive() {
        txn.commit().await?;
        return Ok(None);
    }

    let mut new = NewPayment::new(
        order_id,
        user_id,
        order.balance_due,
        payment_date,
        payment_method,
    );
    new.notes = Some(format!("Settlement of {}", order.po_number));
    let (payment, order) = record_payment(&txn, new).await?;
    txn.commit().await?;

    log_recorded(&payment, &order);
    Ok(Some(payment))
}

/// Finds a payment by id, returning `None` if it does not exist or is deleted.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Ok(Payment::find_by_id(payment_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted))
}

/// Retrieves an order's payment history, most recent payment date first.
pub async fn get_payments_for_order(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::PurchaseOrderId.eq(order_id))
        .filter(payment::Column::IsDeleted.eq(false))
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::OrderPaymentStatus;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn units(n: i64) -> Amount {
        Amount::from_units(n)
    }

    async fn order(db: &DatabaseConnection, id: i64) -> purchase_order::Model {
        PurchaseOrder::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for amount in [Amount::ZERO, Amount::from_minor(-100)] {
            let new = NewPayment::new(1, 1, amount, test_date(), PaymentMethod::Cash);
            let result = create_payment(&db, new).await;
            assert!(
                matches!(result, Err(Error::Validation { ref field, .. }) if field == "amount_paid")
            );
        }

        let update = PaymentUpdate {
            amount_paid: Some(Amount::ZERO),
            ..PaymentUpdate::default()
        };
        assert!(matches!(
            update_payment(&db, 1, update).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_payment_unknown_order() -> Result<()> {
        let db = setup_test_db().await?;
        let new = NewPayment::new(999, 1, units(10), test_date(), PaymentMethod::Cash);
        assert!(matches!(
            create_payment(&db, new).await,
            Err(Error::NotFound { entity: "Purchase order", .. })
        ));
        assert!(Payment::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_scenarios_a_b_c() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;

        // A: a 40.00 payment leaves the order partially paid
        let first = create_test_payment(&db, po.id, units(40)).await?;
        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, units(40));
        assert_eq!(o.balance_due, units(60));
        assert_eq!(o.payment_status, OrderPaymentStatus::PartiallyPaid);
        assert_eq!(first.remaining_balance, units(60));
        assert_invariants(&db, po.id).await?;

        // B: another 60.00 pays it off
        let second = create_test_payment(&db, po.id, units(60)).await?;
        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, units(100));
        assert_eq!(o.balance_due, Amount::ZERO);
        assert_eq!(o.payment_status, OrderPaymentStatus::Paid);
        assert_eq!(second.remaining_balance, Amount::ZERO);
        assert_invariants(&db, po.id).await?;

        // C: deleting the 60.00 payment reverses it
        delete_payment(&db, second.id).await?;
        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, units(40));
        assert_eq!(o.balance_due, units(60));
        assert_eq!(o.payment_status, OrderPaymentStatus::PartiallyPaid);
        assert_invariants(&db, po.id).await?;

        let history = get_payments_for_order(&db, po.id).await?;
        assert_eq!(history.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_d_overpayment_clamps() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        create_test_payment(&db, po.id, units(150)).await?;

        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, units(150));
        assert_eq!(o.balance_due, Amount::ZERO);
        assert_eq!(o.payment_status, OrderPaymentStatus::Paid);
        assert_invariants(&db, po.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_e_move_payment_between_orders() -> Result<()> {
        let (db, first) = setup_with_order(units(100)).await?;
        let second = create_test_order(&db, first.customer_id, units(100)).await?;
        let payment = create_test_payment(&db, first.id, units(40)).await?;

        let update = PaymentUpdate {
            purchase_order_id: Some(second.id),
            ..PaymentUpdate::default()
        };
        let moved = update_payment(&db, payment.id, update).await?;
        assert_eq!(moved.purchase_order_id, second.id);
        assert_eq!(moved.remaining_balance, units(60));

        let o1 = order(&db, first.id).await;
        assert_eq!(o1.amount_paid, Amount::ZERO);
        assert_eq!(o1.balance_due, units(100));
        assert_eq!(o1.payment_status, OrderPaymentStatus::Unpaid);

        let o2 = order(&db, second.id).await;
        assert_eq!(o2.amount_paid, units(40));
        assert_eq!(o2.balance_due, units(60));
        assert_eq!(o2.payment_status, OrderPaymentStatus::PartiallyPaid);

        assert_invariants(&db, first.id).await?;
        assert_invariants(&db, second.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_move_payment_with_new_amount_and_status() -> Result<()> {
        let (db, first) = setup_with_order(units(100)).await?;
        let second = create_test_order(&db, first.customer_id, units(100)).await?;
        let payment = create_test_payment(&db, first.id, units(40)).await?;

        // Moved as pending: neither order counts it
        let update = PaymentUpdate {
            purchase_order_id: Some(second.id),
            amount_paid: Some(units(70)),
            status: Some(PaymentStatus::Pending),
            ..PaymentUpdate::default()
        };
        update_payment(&db, payment.id, update).await?;
        assert_eq!(order(&db, first.id).await.amount_paid, Amount::ZERO);
        assert_eq!(order(&db, second.id).await.amount_paid, Amount::ZERO);

        // Completed later on the new order
        let update = PaymentUpdate {
            status: Some(PaymentStatus::Completed),
            ..PaymentUpdate::default()
        };
        update_payment(&db, payment.id, update).await?;
        assert_eq!(order(&db, first.id).await.amount_paid, Amount::ZERO);
        assert_eq!(order(&db, second.id).await.amount_paid, units(70));
        assert_invariants(&db, first.id).await?;
        assert_invariants(&db, second.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_f_pending_payment_leaves_order_unchanged() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let before = order(&db, po.id).await;

        let new = NewPayment::new(po.id, 1, units(30), test_date(), PaymentMethod::MobileMoney)
            .with_status(PaymentStatus::Pending);
        let pending = create_payment(&db, new).await?;
        assert_eq!(pending.status, PaymentStatus::Pending);

        let after = order(&db, po.id).await;
        assert_eq!(after.amount_paid, before.amount_paid);
        assert_eq!(after.balance_due, before.balance_due);
        assert_eq!(after.payment_status, OrderPaymentStatus::Unpaid);

        // Deleting a payment that never counted changes nothing either
        delete_payment(&db, pending.id).await?;
        assert_eq!(order(&db, po.id).await.balance_due, units(100));
        assert_invariants(&db, po.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_amount_and_status_on_same_order() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let payment = create_test_payment(&db, po.id, units(40)).await?;

        let update = PaymentUpdate {
            amount_paid: Some(units(55)),
            ..PaymentUpdate::default()
        };
        let edited = update_payment(&db, payment.id, update).await?;
        assert_eq!(edited.remaining_balance, units(45));
        assert_eq!(order(&db, po.id).await.amount_paid, units(55));

        let update = PaymentUpdate {
            status: Some(PaymentStatus::Refunded),
            notes: Some("Cheque bounced".to_string()),
            ..PaymentUpdate::default()
        };
        let refunded = update_payment(&db, payment.id, update).await?;
        assert_eq!(refunded.notes.as_deref(), Some("Cheque bounced"));
        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, Amount::ZERO);
        assert_eq!(o.payment_status, OrderPaymentStatus::Unpaid);
        assert_invariants(&db, po.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_move_rolls_back() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let payment = create_test_payment(&db, po.id, units(40)).await?;

        let update = PaymentUpdate {
            purchase_order_id: Some(999),
            amount_paid: Some(units(10)),
            ..PaymentUpdate::default()
        };
        assert!(matches!(
            update_payment(&db, payment.id, update).await,
            Err(Error::NotFound { .. })
        ));

        let stored = get_payment_by_id(&db, payment.id).await?.unwrap();
        assert_eq!(stored.purchase_order_id, po.id);
        assert_eq!(stored.amount_paid, units(40));
        assert_eq!(order(&db, po.id).await.amount_paid, units(40));
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_numbers_are_unique() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let a = create_test_payment(&db, po.id, units(1)).await?;
        let b = create_test_payment(&db, po.id, units(1)).await?;
        delete_payment(&db, a.id).await?;
        let c = create_test_payment(&db, po.id, units(1)).await?;

        assert!(a.payment_number.starts_with("PAY-"));
        assert!(a.payment_number.ends_with("-0001"));
        assert!(b.payment_number.ends_with("-0002"));
        assert!(c.payment_number.ends_with("-0003"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_payment_twice_is_not_found() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let payment = create_test_payment(&db, po.id, units(10)).await?;
        delete_payment(&db, payment.id).await?;
        assert!(matches!(
            delete_payment(&db, payment.id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            update_payment(&db, payment.id, PaymentUpdate::default()).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_settle_order() -> Result<()> {
        let (db, po) = setup_with_order(Amount::from_minor(12_345)).await?;
        create_test_payment(&db, po.id, units(45)).await?;

        let settlement = settle_order(&db, po.id, 3, test_date(), PaymentMethod::BankTransfer)
            .await?
            .unwrap();
        assert_eq!(settlement.amount_paid, Amount::from_minor(7_845));
        assert_eq!(settlement.status, PaymentStatus::Completed);
        assert_eq!(settlement.remaining_balance, Amount::ZERO);

        let o = order(&db, po.id).await;
        assert_eq!(o.payment_status, OrderPaymentStatus::Paid);
        assert_invariants(&db, po.id).await?;

        // Nothing left to settle
        assert!(settle_order(&db, po.id, 3, test_date(), PaymentMethod::Cash).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_settle_order_uses_balance_derived_in_transaction() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        create_test_payment(&db, po.id, units(40)).await?;

        // A stale stored balance must not decide the settlement amount
        let mut stale: purchase_order::ActiveModel = order(&db, po.id).await.into();
        stale.balance_due = Set(units(5));
        stale.update(&db).await?;

        let settlement = settle_order(&db, po.id, 1, test_date(), PaymentMethod::Cash)
            .await?
            .unwrap();
        assert_eq!(settlement.amount_paid, units(60));

        let o = order(&db, po.id).await;
        assert_eq!(o.amount_paid, units(100));
        assert_eq!(o.payment_status, OrderPaymentStatus::Paid);
        assert_invariants(&db, po.id).await?;

        assert!(matches!(
            settle_order(&db, 999, 1, test_date(), PaymentMethod::Cash).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_payment_metadata() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let payment = create_test_payment(&db, po.id, units(40)).await?;

        let update = PaymentUpdate {
            account_code: Some("4000-SALES".to_string()),
            tax_receipt_number: Some("TR-2025-0042".to_string()),
            reference_number: Some("CHQ-118".to_string()),
            ..PaymentUpdate::default()
        };
        update_payment(&db, payment.id, update).await?;

        let stored = get_payment_by_id(&db, payment.id).await?.unwrap();
        assert_eq!(stored.account_code.as_deref(), Some("4000-SALES"));
        assert_eq!(stored.tax_receipt_number.as_deref(), Some("TR-2025-0042"));
        assert_eq!(stored.reference_number.as_deref(), Some("CHQ-118"));
        assert_eq!(stored.amount_paid, units(40));
        assert_eq!(order(&db, po.id).await.amount_paid, units(40));
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_history_order() -> Result<()> {
        let (db, po) = setup_with_order(units(100)).await?;
        let older = NewPayment::new(
            po.id,
            1,
            units(10),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            PaymentMethod::Check,
        );
        let newer = NewPayment::new(
            po.id,
            1,
            units(10),
            NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
            PaymentMethod::Check,
        );
        let older = create_payment(&db, older).await?;
        let newer = create_payment(&db, newer).await?;

        let history = get_payments_for_order(&db, po.id).await?;
        assert_eq!(
            history.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        Ok(())
    }
}
