//! Read-only lookups of customers and inventory.
//!
//! Customers and inventory are managed elsewhere; orders only need to confirm that the rows
//! they reference exist, and new lines take their default unit and price from inventory.

use crate::{
    core::{line_items::ItemInput, money::Amount},
    entities::{Customer, Inventory, customer, inventory},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use std::collections::BTreeSet;

/// Unit label used when an inventory item has no packaging type
pub const DEFAULT_UNIT: &str = "pcs";

/// Defaults for a new order line taken from an inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefaults {
    pub unit: String,
    pub unit_price: Amount,
}

/// Returns the customer, failing if it does not exist or is deleted.
pub async fn require_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| Error::not_found("Customer", customer_id))
}

/// Returns the inventory item, failing if it does not exist or is deleted.
pub async fn require_inventory<C>(db: &C, inventory_id: i64) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    Inventory::find_by_id(inventory_id)
        .one(db)
        .await?
        .filter(|i| !i.is_deleted)
        .ok_or_else(|| Error::not_found("Inventory item", inventory_id))
}

/// Confirms that every line references an existing inventory item.
pub async fn require_inventory_for_items<C>(db: &C, items: &[ItemInput]) -> Result<()>
where
    C: ConnectionTrait,
{
    let ids: BTreeSet<i64> = items.iter().map(|i| i.inventory_id).collect();
    let found: BTreeSet<i64> = Inventory::find()
        .filter(inventory::Column::Id.is_in(ids.iter().copied()))
        .filter(inventory::Column::IsDeleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();

    match ids.difference(&found).next() {
        Some(missing) => Err(Error::not_found("Inventory item", missing)),
        None => Ok(()),
    }
}

/// Default unit and unit price for a new line of the given inventory item.
///
/// The unit is the item's packaging type, or [`DEFAULT_UNIT`] when it has none.
pub async fn item_defaults_from_inventory<C>(db: &C, inventory_id: i64) -> Result<ItemDefaults>
where
    C: ConnectionTrait,
{
    let item = require_inventory(db, inventory_id).await?;
    Ok(ItemDefaults {
        unit: item
            .packaging_type
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        unit_price: item.selling_price,
    })
}

/// Builds a new order line for an inventory item using its defaults.
pub async fn item_from_inventory<C>(db: &C, inventory_id: i64, quantity: Amount) -> Result<ItemInput>
where
    C: ConnectionTrait,
{
    let defaults = item_defaults_from_inventory(db, inventory_id).await?;
    Ok(ItemInput::new(
        inventory_id,
        quantity,
        &defaults.unit,
        defaults.unit_price,
    ))
}
