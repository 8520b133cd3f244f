//! Document number generation.
//!
//! Order and payment numbers have the form `PREFIX-YYYYMMDD-NNNN`, where `NNNN` is a
//! zero-padded per-day counter. Counters live in the `number_sequences` table, one row per
//! prefix and day, and are advanced with a single `UPDATE ... SET last_value = last_value + 1`
//! inside the caller's transaction. Two callers can therefore never read the same value, and
//! a number issued by a transaction that rolls back is released with it.

use crate::{
    entities::{NumberSequence, number_sequence},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::debug;

/// Prefix of purchase order numbers
pub const ORDER_PREFIX: &str = "PO";
/// Prefix of payment numbers
pub const PAYMENT_PREFIX: &str = "PAY";

/// Key of the counter row for a prefix and day, e.g. `"PAY-20250315"`.
#[must_use]
pub fn sequence_key(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}", date.format("%Y%m%d"))
}

/// Formats a document number, e.g. `format_number("PAY", 2025-03-15, 3)` is `PAY-20250315-0003`.
#[must_use]
pub fn format_number(prefix: &str, date: NaiveDate, value: i64) -> String {
    format!("{}-{value:04}", sequence_key(prefix, date))
}

async fn increment<C>(db: &C, key: &str) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let result = NumberSequence::update_many()
        .col_expr(
            number_sequence::Column::LastValue,
            Expr::col(number_sequence::Column::LastValue).add(1),
        )
        .col_expr(
            number_sequence::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(number_sequence::Column::Key.eq(key))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    let row = NumberSequence::find()
        .filter(number_sequence::Column::Key.eq(key))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Number sequence", key))?;
    Ok(Some(row.last_value))
}

/// Advances the counter for `key` and returns the new value, starting at 1.
pub async fn next_value<C>(db: &C, key: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    if let Some(value) = increment(db, key).await? {
        return Ok(value);
    }

    let first = number_sequence::ActiveModel {
        key: Set(key.to_string()),
        last_value: Set(1),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    match first.insert(db).await.map_err(Error::from) {
        Ok(row) => Ok(row.last_value),
        // Someone else started this sequence between our update and insert
        Err(Error::Conflict { .. }) => increment(db, key)
            .await?
            .ok_or_else(|| Error::not_found("Number sequence", key)),
        Err(e) => Err(e),
    }
}

/// Issues the next number for a prefix on a given day.
pub async fn next_number<C>(db: &C, prefix: &str, date: NaiveDate) -> Result<String>
where
    C: ConnectionTrait,
{
    let value = next_value(db, &sequence_key(prefix, date)).await?;
    let number = format_number(prefix, date, value);
    debug!(number = %number, "Issued document number");
    Ok(number)
}

/// Issues the next purchase order number, e.g. `PO-20250315-0001`.
pub async fn next_po_number<C>(db: &C, date: NaiveDate) -> Result<String>
where
    C: ConnectionTrait,
{
    next_number(db, ORDER_PREFIX, date).await
}

/// Issues the next payment number, e.g. `PAY-20250315-0001`.
pub async fn next_payment_number<C>(db: &C, date: NaiveDate) -> Result<String>
where
    C: ConnectionTrait,
{
    next_number(db, PAYMENT_PREFIX, date).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::TransactionTrait;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("PAY", day(2025, 3, 15), 3), "PAY-20250315-0003");
        assert_eq!(format_number("PO", day(2025, 12, 1), 12345), "PO-20251201-12345");
    }

    #[tokio::test]
    async fn test_sequence_starts_at_one_and_increments() -> Result<()> {
        let db = setup_test_db().await?;
        let date = day(2025, 3, 15);

        assert_eq!(next_payment_number(&db, date).await?, "PAY-20250315-0001");
        assert_eq!(next_payment_number(&db, date).await?, "PAY-20250315-0002");
        assert_eq!(next_payment_number(&db, date).await?, "PAY-20250315-0003");
        Ok(())
    }

    #[tokio::test]
    async fn test_sequences_are_independent_per_prefix_and_day() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(next_po_number(&db, day(2025, 3, 15)).await?, "PO-20250315-0001");
        assert_eq!(next_payment_number(&db, day(2025, 3, 15)).await?, "PAY-20250315-0001");
        assert_eq!(next_po_number(&db, day(2025, 3, 16)).await?, "PO-20250316-0001");
        assert_eq!(next_po_number(&db, day(2025, 3, 15)).await?, "PO-20250315-0002");
        Ok(())
    }

    #[tokio::test]
    async fn test_rolled_back_number_is_reissued() -> Result<()> {
        let db = setup_test_db().await?;
        let date = day(2025, 3, 15);
        next_po_number(&db, date).await?;

        let txn = db.begin().await?;
        assert_eq!(next_po_number(&txn, date).await?, "PO-20250315-0002");
        txn.rollback().await?;

        assert_eq!(next_po_number(&db, date).await?, "PO-20250315-0002");
        Ok(())
    }
}
