//! Line-item calculator.
//!
//! Validates submitted order lines, derives each line's subtotal, tax, discount and total,
//! and aggregates lines into order-level totals:
//!
//! - `subtotal = quantity * unit_price`
//! - `tax_amount = subtotal * tax_rate / 100`
//! - `discount_amount = subtotal * discount_rate / 100`
//! - `total = subtotal + tax_amount - discount_amount`
//!
//! A client may submit a line's tax or discount amount instead of leaving it to the rate.
//! A submitted amount is kept as-is, but it has to agree with the rate-derived amount to
//! within [`MONEY_TOLERANCE`]; anything else is rejected as a validation error.

use crate::{
    core::money::{Amount, MONEY_TOLERANCE},
    entities::purchase_order_item,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// One order line as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    /// Id of an existing line when editing an order; `None` for a new line
    #[serde(default)]
    pub id: Option<i64>,
    pub inventory_id: i64,
    pub quantity: Amount,
    pub unit: String,
    pub unit_price: Amount,
    #[serde(default)]
    pub tax_rate: Amount,
    /// Client-computed tax; derived from `tax_rate` when absent
    #[serde(default)]
    pub tax_amount: Option<Amount>,
    #[serde(default)]
    pub discount_rate: Amount,
    /// Client-computed discount; derived from `discount_rate` when absent
    #[serde(default)]
    pub discount_amount: Option<Amount>,
}

impl ItemInput {
    /// A new line with no tax or discount.
    #[must_use]
    pub fn new(inventory_id: i64, quantity: Amount, unit: &str, unit_price: Amount) -> Self {
        Self {
            id: None,
            inventory_id,
            quantity,
            unit: unit.to_string(),
            unit_price,
            tax_rate: Amount::ZERO,
            tax_amount: None,
            discount_rate: Amount::ZERO,
            discount_amount: None,
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub const fn with_tax_rate(mut self, rate: Amount) -> Self {
        self.tax_rate = rate;
        self
    }

    #[must_use]
    pub const fn with_discount_rate(mut self, rate: Amount) -> Self {
        self.discount_rate = rate;
        self
    }
}

/// Derived amounts of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineTotals {
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub discount_amount: Amount,
    pub total: Amount,
}

impl From<&purchase_order_item::Model> for LineTotals {
    fn from(item: &purchase_order_item::Model) -> Self {
        Self {
            subtotal: item.subtotal,
            tax_amount: item.tax_amount,
            discount_amount: item.discount_amount,
            total: item.total,
        }
    }
}

/// Derived amounts of a whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub shipping_cost: Amount,
    /// Line discounts plus any order-level discount
    pub discount_amount: Amount,
    pub total_amount: Amount,
}

/// Largest accepted tax or discount rate, in percent
pub const MAX_RATE: Amount = Amount::from_units(100);

fn field(index: usize, name: &str) -> String {
    format!("items[{index}].{name}")
}

fn require_rate(index: usize, name: &str, rate: Amount) -> Result<()> {
    require_non_negative(index, name, rate)?;
    if rate > MAX_RATE {
        return Err(Error::validation(
            field(index, name),
            format!("must not exceed {MAX_RATE}, got {rate}"),
        ));
    }
    Ok(())
}

fn too_large(index: usize, name: &str) -> Error {
    Error::validation(field(index, name), "amount is too large")
}

fn require_non_negative(index: usize, name: &str, value: Amount) -> Result<()> {
    if value.is_negative() {
        return Err(Error::validation(
            field(index, name),
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

/// Keeps a submitted amount if it agrees with the derived one, otherwise rejects it.
fn reconcile_submitted(
    index: usize,
    name: &str,
    submitted: Option<Amount>,
    derived: Amount,
) -> Result<Amount> {
    match submitted {
        None => Ok(derived),
        Some(amount) if amount.abs_diff(derived) <= MONEY_TOLERANCE => Ok(amount),
        Some(amount) => Err(Error::validation(
            field(index, name),
            format!("submitted {amount} does not match {derived} derived from the rate"),
        )),
    }
}

/// Checks the required fields and numeric limits of one line.
pub fn validate_item(index: usize, item: &ItemInput) -> Result<()> {
    if !item.quantity.is_positive() {
        return Err(Error::validation(
            field(index, "quantity"),
            format!("must be greater than zero, got {}", item.quantity),
        ));
    }
    if item.unit.trim().is_empty() {
        return Err(Error::validation(field(index, "unit"), "is required"));
    }
    require_non_negative(index, "unit_price", item.unit_price)?;
    require_rate(index, "tax_rate", item.tax_rate)?;
    require_rate(index, "discount_rate", item.discount_rate)?;
    if let Some(tax) = item.tax_amount {
        require_non_negative(index, "tax_amount", tax)?;
    }
    if let Some(discount) = item.discount_amount {
        require_non_negative(index, "discount_amount", discount)?;
    }
    Ok(())
}

/// Validates one line and derives its amounts.
///
/// # Errors
/// Returns [`Error::Validation`] naming the offending field (`items[i].field`).
pub fn calculate_line(index: usize, item: &ItemInput) -> Result<LineTotals> {
    validate_item(index, item)?;

    let subtotal = item
        .quantity
        .checked_times(item.unit_price)
        .ok_or_else(|| too_large(index, "subtotal"))?;
    let tax_amount = reconcile_submitted(
        index,
        "tax_amount",
        item.tax_amount,
        subtotal
            .checked_percent(item.tax_rate)
            .ok_or_else(|| too_large(index, "tax_amount"))?,
    )?;
    let discount_amount = reconcile_submitted(
        index,
        "discount_amount",
        item.discount_amount,
        subtotal
            .checked_percent(item.discount_rate)
            .ok_or_else(|| too_large(index, "discount_amount"))?,
    )?;
    let total = subtotal
        .checked_add(tax_amount)
        .and_then(|t| t.checked_sub(discount_amount))
        .ok_or_else(|| too_large(index, "total"))?;

    Ok(LineTotals {
        subtotal,
        tax_amount,
        discount_amount,
        total,
    })
}

/// Validates every line of an order and derives their amounts, in order.
///
/// # Errors
/// Returns [`Error::Validation`] if the list is empty or any line is invalid.
pub fn calculate_lines(items: &[ItemInput]) -> Result<Vec<LineTotals>> {
    if items.is_empty() {
        return Err(Error::validation("items", "at least one item is required"));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| calculate_line(index, item))
        .collect()
}

/// Aggregates line amounts into order totals.
///
/// `order_discount` is an order-level discount on top of the line discounts.
#[must_use]
pub fn aggregate_totals<'a, I>(lines: I, shipping_cost: Amount, order_discount: Amount) -> OrderTotals
where
    I: IntoIterator<Item = &'a LineTotals>,
{
    let mut totals = OrderTotals {
        shipping_cost,
        discount_amount: order_discount,
        ..OrderTotals::default()
    };
    for line in lines {
        totals.subtotal += line.subtotal;
        totals.tax_amount += line.tax_amount;
        totals.discount_amount += line.discount_amount;
    }
    totals.total_amount =
        totals.subtotal + totals.tax_amount + totals.shipping_cost - totals.discount_amount;
    totals
}

/// Validates the order-level inputs and the aggregated result.
///
/// # Errors
/// Returns [`Error::Validation`] for a negative shipping cost or discount, or when the
/// discounts exceed everything else so the order total would be negative.
pub fn validate_order_totals(totals: &OrderTotals, order_discount: Amount) -> Result<()> {
    if totals.shipping_cost.is_negative() {
        return Err(Error::validation("shipping_cost", "must not be negative"));
    }
    if order_discount.is_negative() {
        return Err(Error::validation("discount_amount", "must not be negative"));
    }
    if totals.total_amount.is_negative() {
        return Err(Error::validation(
            "discount_amount",
            format!("discounts exceed the order value, total would be {}", totals.total_amount),
        ));
    }
    Ok(())
}

/// Sums every component of the order total without saturating.
fn check_order_range(lines: &[LineTotals], shipping_cost: Amount) -> Result<()> {
    lines
        .iter()
        .try_fold(shipping_cost, |acc, l| {
            acc.checked_add(l.subtotal)?.checked_add(l.tax_amount)
        })
        .map(|_| ())
        .ok_or_else(|| Error::validation("items", "order total is too large"))
}

/// Aggregates already calculated lines and validates the order-level inputs.
pub fn calculate_order_totals(
    lines: &[LineTotals],
    shipping_cost: Amount,
    order_discount: Amount,
) -> Result<OrderTotals> {
    check_order_range(lines, shipping_cost)?;
    let totals = aggregate_totals(lines, shipping_cost, order_discount);
    validate_order_totals(&totals, order_discount)?;
    Ok(totals)
}

/// Validates lines and order-level inputs and returns both line and order totals.
pub fn calculate_order(
    items: &[ItemInput],
    shipping_cost: Amount,
    order_discount: Amount,
) -> Result<(Vec<LineTotals>, OrderTotals)> {
    let lines = calculate_lines(items)?;
    let totals = calculate_order_totals(&lines, shipping_cost, order_discount)?;
    Ok((lines, totals))
}
