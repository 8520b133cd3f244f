//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    Customer, Inventory, NumberSequence, Payment, PurchaseOrder, PurchaseOrderItem,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::debug;

/// Default `SQLite` database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/po_reconcile.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// `fallback`.
#[must_use]
pub fn get_database_url(fallback: &str) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| fallback.to_string())
}

/// Establishes a connection to the database at `DATABASE_URL`, or `fallback` when unset.
pub async fn create_connection(fallback: &str) -> Result<DatabaseConnection> {
    let database_url = get_database_url(fallback);
    debug!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(builder.build(&stmt)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Referenced tables come first: customers and inventory, then orders, their lines,
/// payments, and the number sequences.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Inventory).await?;
    create_table(db, &schema, PurchaseOrder).await?;
    create_table(db, &schema, PurchaseOrderItem).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, NumberSequence).await?;

    Ok(())
}
