//! Order balance engine.
//!
//! Derives an order's `balance_due` and `payment_status` from its total and the amount paid,
//! and rewrites those columns after every change to either. The amount paid is never
//! adjusted incrementally: it is recomputed as the sum of the order's completed, non-deleted
//! payments inside the caller's transaction, so the stored value cannot drift from the
//! payment records.

use crate::{
    core::money::{Amount, clamp_non_negative},
    entities::{
        OrderPaymentStatus, Payment, PaymentStatus, PurchaseOrder, payment, purchase_order,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::debug;

/// The derived payment columns of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub amount_paid: Amount,
    pub balance_due: Amount,
    pub payment_status: OrderPaymentStatus,
}

/// Classifies an order from what has been paid and what is still due.
///
/// - `paid` when nothing is due
/// - `partially_paid` when something is due and something has been paid
/// - `unpaid` otherwise
#[must_use]
pub fn status_for(amount_paid: Amount, balance_due: Amount) -> OrderPaymentStatus {
    if !balance_due.is_positive() {
        OrderPaymentStatus::Paid
    } else if amount_paid.is_positive() {
        OrderPaymentStatus::PartiallyPaid
    } else {
        OrderPaymentStatus::Unpaid
    }
}

/// Derives `(balance_due, payment_status)` from an order total and the amount paid.
///
/// Pure and idempotent: identical inputs always give identical outputs.
#[must_use]
pub fn derive_balance(total_amount: Amount, amount_paid: Amount) -> (Amount, OrderPaymentStatus) {
    let balance_due = clamp_non_negative(total_amount - amount_paid);
    (balance_due, status_for(amount_paid, balance_due))
}

/// Same as [`derive_balance`] but keeps the amount paid alongside the result.
#[must_use]
pub fn snapshot(total_amount: Amount, amount_paid: Amount) -> BalanceSnapshot {
    let (balance_due, payment_status) = derive_balance(total_amount, amount_paid);
    BalanceSnapshot {
        amount_paid,
        balance_due,
        payment_status,
    }
}

/// Sums the payments that count towards an order: completed and not deleted.
#[must_use]
pub fn completed_total(payments: &[payment::Model]) -> Amount {
    payments
        .iter()
        .filter(|p| !p.is_deleted && p.status.is_active())
        .map(|p| p.amount_paid)
        .sum()
}

/// Loads and sums the completed, non-deleted payments of an order.
pub async fn completed_payments_total<C>(db: &C, order_id: i64) -> Result<Amount>
where
    C: ConnectionTrait,
{
    let payments = Payment::find()
        .filter(payment::Column::PurchaseOrderId.eq(order_id))
        .filter(payment::Column::IsDeleted.eq(false))
        .filter(payment::Column::Status.eq(PaymentStatus::Completed))
        .all(db)
        .await?;

    Ok(completed_total(&payments))
}

/// Copies a snapshot onto an order's active model.
pub fn apply_snapshot(order: &mut purchase_order::ActiveModel, snapshot: BalanceSnapshot) {
    order.amount_paid = Set(snapshot.amount_paid);
    order.balance_due = Set(snapshot.balance_due);
    order.payment_status = Set(snapshot.payment_status);
}

/// Recomputes and stores an order's `amount_paid`, `balance_due` and `payment_status`.
///
/// Meant to run inside the transaction that changed the order's total or one of its
/// payments. Any failure while writing is reported as [`Error::Reconciliation`] so the
/// caller's transaction is dropped and rolled back.
///
/// # Errors
/// - [`Error::NotFound`] if the order does not exist or is deleted
/// - [`Error::Reconciliation`] if reading payments or writing the order fails
pub async fn refresh_order_balance<C>(db: &C, order_id: i64) -> Result<purchase_order::Model>
where
    C: ConnectionTrait,
{
    let order = PurchaseOrder::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|o| !o.is_deleted)
        .ok_or_else(|| Error::not_found("Purchase order", order_id))?;

    let amount_paid = completed_payments_total(db, order_id)
        .await
        .map_err(Error::reconciliation)?;
    let snap = snapshot(order.total_amount, amount_paid);

    debug!(
        order_id,
        total = %order.total_amount,
        amount_paid = %snap.amount_paid,
        balance_due = %snap.balance_due,
        status = ?snap.payment_status,
        "Derived order balance"
    );

    let mut active: purchase_order::ActiveModel = order.into();
    apply_snapshot(&mut active, snap);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    active.update(db).await.map_err(Error::reconciliation)
}
