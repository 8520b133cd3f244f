//! Purchase order lifecycle - Creating, editing and deleting orders with their lines.
//!
//! Every operation runs in one database transaction. Line and order totals come from the
//! line-item calculator; `amount_paid`, `balance_due` and `payment_status` come from the
//! balance engine. Editing an order never changes what has been paid against it, only what
//! is still due.

use crate::{
    core::{
        balance::{self, refresh_order_balance},
        inventory::{require_customer, require_inventory_for_items},
        line_items::{self, ItemInput, LineTotals, OrderTotals},
        money::{Amount, clamp_non_negative},
        numbering,
    },
    entities::{
        OrderPaymentStatus, Payment, PurchaseOrder, PurchaseOrderItem, payment, purchase_order,
        purchase_order_item,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    DatabaseTransaction, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// A new order as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Explicit order number; one is generated when `None`
    #[serde(default)]
    pub po_number: Option<String>,
    pub customer_id: i64,
    /// User creating the order
    pub user_id: i64,
    pub order_date: NaiveDate,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub shipping_cost: Amount,
    /// Order-level discount on top of the line discounts
    #[serde(default)]
    pub discount_amount: Amount,
    pub items: Vec<ItemInput>,
}

/// A full edit of an existing order.
///
/// `items` is the complete new set of lines: lines with an `id` are updated, lines without
/// one are added, and existing lines missing from the set are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// New customer; unchanged when `None`
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// New order date; unchanged when `None`
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    /// New payment terms; unchanged when `None`
    #[serde(default)]
    pub payment_terms: Option<String>,
    /// New shipping cost; unchanged when `None`
    #[serde(default)]
    pub shipping_cost: Option<Amount>,
    /// New order-level discount; unchanged when `None`
    #[serde(default)]
    pub discount_amount: Option<Amount>,
    pub items: Vec<ItemInput>,
}

fn item_active_model(
    order_id: i64,
    input: &ItemInput,
    line: &LineTotals,
) -> purchase_order_item::ActiveModel {
    purchase_order_item::ActiveModel {
        purchase_order_id: Set(order_id),
        inventory_id: Set(input.inventory_id),
        quantity: Set(input.quantity),
        unit: Set(input.unit.trim().to_string()),
        unit_price: Set(input.unit_price),
        tax_rate: Set(input.tax_rate),
        tax_amount: Set(line.tax_amount),
        discount_rate: Set(input.discount_rate),
        discount_amount: Set(line.discount_amount),
        subtotal: Set(line.subtotal),
        total: Set(line.total),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
}

fn apply_totals(order: &mut purchase_order::ActiveModel, totals: &OrderTotals) {
    order.subtotal = Set(totals.subtotal);
    order.tax_amount = Set(totals.tax_amount);
    order.shipping_cost = Set(totals.shipping_cost);
    order.discount_amount = Set(totals.discount_amount);
    order.total_amount = Set(totals.total_amount);
}

async fn find_active_order(
    txn: &DatabaseTransaction,
    order_id: i64,
) -> Result<purchase_order::Model> {
    PurchaseOrder::find_by_id(order_id)
        .one(txn)
        .await?
        .filter(|o| !o.is_deleted)
        .ok_or_else(|| Error::not_found("Purchase order", order_id))
}

/// Issues the next generated order number that no order uses yet.
///
/// Explicit numbers share the namespace, so taken numbers are skipped.
async fn next_free_po_number(txn: &DatabaseTransaction, date: NaiveDate) -> Result<String> {
    loop {
        let number = numbering::next_po_number(txn, date).await?;
        let taken = PurchaseOrder::find()
            .filter(purchase_order::Column::PoNumber.eq(number.as_str()))
            .one(txn)
            .await?
            .is_some();
        if !taken {
            return Ok(number);
        }
        debug!(po_number = %number, "Skipping order number already in use");
    }
}

/// Creates an order and its lines.
///
/// The order starts with nothing paid, so its balance due is its total and its status is
/// `unpaid` (or `paid` for a zero-total order).
///
/// # Errors
/// - [`Error::Validation`] for an empty line list or invalid amounts, before any write
/// - [`Error::NotFound`] for an unknown customer or inventory item
/// - [`Error::Conflict`] if the order number is already taken
pub async fn create_order(db: &DatabaseConnection, new: NewOrder) -> Result<purchase_order::Model> {
    let (lines, totals) =
        line_items::calculate_order(&new.items, new.shipping_cost, new.discount_amount)?;
    let explicit_number = match new.po_number.as_deref().map(str::trim) {
        Some("") => return Err(Error::validation("po_number", "must not be empty")),
        other => other.map(ToString::to_string),
    };

    let txn = db.begin().await?;

    require_customer(&txn, new.customer_id).await?;
    require_inventory_for_items(&txn, &new.items).await?;

    let po_number = match explicit_number {
        Some(number) => number,
        None => next_free_po_number(&txn, Utc::now().date_naive()).await?,
    };

    let now = Utc::now().naive_utc();
    let mut order = purchase_order::ActiveModel {
        po_number: Set(po_number),
        user_id: Set(new.user_id),
        customer_id: Set(new.customer_id),
        order_date: Set(new.order_date),
        payment_terms: Set(new.payment_terms),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    apply_totals(&mut order, &totals);
    balance::apply_snapshot(&mut order, balance::snapshot(totals.total_amount, Amount::ZERO));

    let order = order.insert(&txn).await?;

    for (input, line) in new.items.iter().zip(&lines) {
        let mut item = item_active_model(order.id, input, line);
        item.created_at = Set(now);
        item.insert(&txn).await?;
    }

    txn.commit().await?;

    info!(
        order_id = order.id,
        po_number = %order.po_number,
        items = lines.len(),
        total = %order.total_amount,
        "Created purchase order"
    );
    Ok(order)
}

/// Edits an order: replaces its lines, recomputes its totals and re-derives its balance.
///
/// Lines are matched by id, so lines that survive an edit keep their identity.
///
/// # Errors
/// - [`Error::Validation`] for invalid lines, or a line id that does not belong to the order
/// - [`Error::NotFound`] for an unknown or deleted order, customer or inventory item
/// - [`Error::Reconciliation`] if the balance update fails
pub async fn update_order(
    db: &DatabaseConnection,
    order_id: i64,
    update: OrderUpdate,
) -> Result<purchase_order::Model> {
    let lines = line_items::calculate_lines(&update.items)?;

    let txn = db.begin().await?;
    let order = find_active_order(&txn, order_id).await?;

    if let Some(customer_id) = update.customer_id {
        require_customer(&txn, customer_id).await?;
    }
    require_inventory_for_items(&txn, &update.items).await?;

    let existing: HashMap<i64, purchase_order_item::Model> = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    // Omitted order-level amounts keep their stored values
    let shipping_cost = update.shipping_cost.unwrap_or(order.shipping_cost);
    let order_discount = match update.discount_amount {
        Some(discount) => discount,
        None => {
            let line_discounts: Amount = existing.values().map(|i| i.discount_amount).sum();
            clamp_non_negative(order.discount_amount - line_discounts)
        }
    };
    let totals = line_items::calculate_order_totals(&lines, shipping_cost, order_discount)?;

    let mut kept = BTreeSet::new();
    for (index, input) in update.items.iter().enumerate() {
        if let Some(id) = input.id {
            if !existing.contains_key(&id) {
                return Err(Error::validation(
                    format!("items[{index}].id"),
                    format!("line {id} does not belong to order {order_id}"),
                ));
            }
            if !kept.insert(id) {
                return Err(Error::validation(
                    format!("items[{index}].id"),
                    format!("line {id} appears more than once"),
                ));
            }
        }
    }

    let removed: Vec<i64> = existing.keys().filter(|id| !kept.contains(id)).copied().collect();
    if !removed.is_empty() {
        PurchaseOrderItem::delete_many()
            .filter(purchase_order_item::Column::Id.is_in(removed.iter().copied()))
            .exec(&txn)
            .await?;
    }

    let now = Utc::now().naive_utc();
    for (input, line) in update.items.iter().zip(&lines) {
        let mut item = item_active_model(order_id, input, line);
        if let Some(id) = input.id {
            item.id = Set(id);
            item.update(&txn).await?;
        } else {
            item.created_at = Set(now);
            item.insert(&txn).await?;
        }
    }

    let mut active: purchase_order::ActiveModel = order.into();
    if let Some(customer_id) = update.customer_id {
        active.customer_id = Set(customer_id);
    }
    if let Some(order_date) = update.order_date {
        active.order_date = Set(order_date);
    }
    if let Some(terms) = update.payment_terms {
        active.payment_terms = Set(Some(terms));
    }
    apply_totals(&mut active, &totals);
    active.updated_at = Set(now);
    active.update(&txn).await?;

    // Payments follow the order's customer
    if let Some(customer_id) = update.customer_id {
        Payment::update_many()
            .col_expr(payment::Column::CustomerId, Expr::value(customer_id))
            .filter(payment::Column::PurchaseOrderId.eq(order_id))
            .exec(&txn)
            .await?;
    }

    let order = refresh_order_balance(&txn, order_id).await?;
    txn.commit().await?;

    info!(
        order_id,
        updated = kept.len(),
        added = update.items.len() - kept.len(),
        removed = removed.len(),
        total = %order.total_amount,
        balance_due = %order.balance_due,
        "Updated purchase order"
    );
    Ok(order)
}

/// Deletes an order: its lines are removed, the order and its payments are soft-deleted.
///
/// # Errors
/// Returns [`Error::NotFound`] if the order does not exist or is already deleted.
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let order = find_active_order(&txn, order_id).await?;
    let now = Utc::now().naive_utc();

    let items = PurchaseOrderItem::delete_many()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
        .exec(&txn)
        .await?;

    let payments = Payment::update_many()
        .col_expr(payment::Column::IsDeleted, Expr::value(true))
        .col_expr(payment::Column::UpdatedAt, Expr::value(now))
        .filter(payment::Column::PurchaseOrderId.eq(order_id))
        .filter(payment::Column::IsDeleted.eq(false))
        .exec(&txn)
        .await?;

    let mut active: purchase_order::ActiveModel = order.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(now);
    active.update(&txn).await?;

    txn.commit().await?;

    info!(
        order_id,
        items = items.rows_affected,
        payments = payments.rows_affected,
        "Deleted purchase order"
    );
    Ok(())
}

/// Finds an order by id, returning `None` if it does not exist or is deleted.
pub async fn get_order_by_id(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<purchase_order::Model>> {
    Ok(PurchaseOrder::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|o| !o.is_deleted))
}

/// Retrieves an order's lines in the order they were added.
pub async fn get_order_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<purchase_order_item::Model>> {
    PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(order_id))
        .order_by_asc(purchase_order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an order together with its lines.
pub async fn get_order_with_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<(purchase_order::Model, Vec<purchase_order_item::Model>)>> {
    match get_order_by_id(db, order_id).await? {
        Some(order) => {
            let items = get_order_items(db, order_id).await?;
            Ok(Some((order, items)))
        }
        None => Ok(None),
    }
}

/// Recomputes an order's totals from its stored lines.
///
/// The order-level discount is whatever part of the stored discount the lines do not
/// account for.
#[must_use]
pub fn totals_from_items(
    order: &purchase_order::Model,
    items: &[purchase_order_item::Model],
) -> OrderTotals {
    let lines: Vec<LineTotals> = items.iter().map(LineTotals::from).collect();
    let line_discounts: Amount = lines.iter().map(|l| l.discount_amount).sum();
    line_items::aggregate_totals(
        &lines,
        order.shipping_cost,
        order.discount_amount - line_discounts,
    )
}

/// Lists orders that still have money due, newest order date first.
pub async fn get_outstanding_orders(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<purchase_order::Model>> {
    let mut query = PurchaseOrder::find()
        .filter(purchase_order::Column::IsDeleted.eq(false))
        .filter(purchase_order::Column::PaymentStatus.is_in([
            OrderPaymentStatus::Unpaid,
            OrderPaymentStatus::PartiallyPaid,
        ]))
        .filter(purchase_order::Column::BalanceDue.gt(Amount::ZERO))
        .order_by_desc(purchase_order::Column::OrderDate)
        .order_by_desc(purchase_order::Column::Id);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.all(db).await.map_err(Into::into)
}
