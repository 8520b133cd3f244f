//! Number sequence entity - Counter rows behind generated document numbers.
//!
//! Each row holds the last number issued for one key, where the key combines a prefix and
//! a day (e.g. `"PAY-20250315"`). Rows are advanced with an in-database increment inside
//! the caller's transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Number sequence database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "number_sequences")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Sequence key (e.g., `"PO-20250315"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Last number issued for this key
    pub last_value: i64,
    /// When this sequence was last advanced
    pub updated_at: DateTime,
}

/// `NumberSequence` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
