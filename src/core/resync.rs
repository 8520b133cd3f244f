//! Balance audit - Recomputes every order's stored balance from its payments.
//!
//! Normal operations keep the balance columns in step on their own; this pass repairs orders
//! whose stored values were written by something else (imports, manual edits).

use crate::{
    core::{
        balance::{apply_snapshot, snapshot},
        money::Amount,
    },
    entities::{OrderPaymentStatus, Payment, PurchaseOrder, payment, purchase_order},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, warn};

/// An order whose stored balance did not match its payments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDrift {
    pub order_id: i64,
    pub po_number: String,
    pub stored_amount_paid: Amount,
    pub actual_amount_paid: Amount,
    pub stored_status: OrderPaymentStatus,
    pub actual_status: OrderPaymentStatus,
}

/// Result of a resync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncReport {
    /// Number of orders checked
    pub checked: usize,
    /// Orders that were corrected
    pub corrected: Vec<BalanceDrift>,
}

impl ResyncReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrected.is_empty()
    }
}

/// Recomputes `amount_paid`, `balance_due` and `payment_status` for every non-deleted order
/// in one transaction and reports the orders that changed.
pub async fn resync_order_balances(db: &DatabaseConnection) -> Result<ResyncReport> {
    let txn = db.begin().await?;

    let orders = PurchaseOrder::find()
        .filter(purchase_order::Column::IsDeleted.eq(false))
        .all(&txn)
        .await?;

    let mut paid_by_order: HashMap<i64, Amount> = HashMap::new();
    for p in Payment::find()
        .filter(payment::Column::IsDeleted.eq(false))
        .all(&txn)
        .await?
        .into_iter()
        .filter(|p| p.status.is_active())
    {
        *paid_by_order.entry(p.purchase_order_id).or_default() += p.amount_paid;
    }

    let mut report = ResyncReport {
        checked: orders.len(),
        corrected: Vec::new(),
    };

    for order in orders {
        let paid = paid_by_order.get(&order.id).copied().unwrap_or_default();
        let snap = snapshot(order.total_amount, paid);
        if snap.amount_paid == order.amount_paid
            && snap.balance_due == order.balance_due
            && snap.payment_status == order.payment_status
        {
            continue;
        }

        warn!(
            order_id = order.id,
            po_number = %order.po_number,
            stored_paid = %order.amount_paid,
            actual_paid = %snap.amount_paid,
            "Order balance drifted from its payments"
        );

        let drift = BalanceDrift {
            order_id: order.id,
            po_number: order.po_number.clone(),
            stored_amount_paid: order.amount_paid,
            actual_amount_paid: snap.amount_paid,
            stored_status: order.payment_status,
            actual_status: snap.payment_status,
        };

        let mut active: purchase_order::ActiveModel = order.into();
        apply_snapshot(&mut active, snap);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await.map_err(Error::reconciliation)?;

        report.corrected.push(drift);
    }

    txn.commit().await?;
    info!(
        checked = report.checked,
        corrected = report.corrected.len(),
        "Resynced order balances"
    );
    Ok(report)
}

/// Renders a resync report for logs.
#[must_use]
pub fn format_resync_summary(report: &ResyncReport) -> String {
    if report.is_clean() {
        return format!("All {} orders balanced", report.checked);
    }

    let mut out = format!(
        "Corrected {} of {} orders:",
        report.corrected.len(),
        report.checked
    );
    for d in &report.corrected {
        out.push_str(&format!(
            "\n  {}: paid {} -> {} ({:?} -> {:?})",
            d.po_number,
            d.stored_amount_paid,
            d.actual_amount_paid,
            d.stored_status,
            d.actual_status
        ));
    }
    out
}
