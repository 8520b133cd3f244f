/// Order balance engine
pub mod balance;
/// Customer and inventory lookups
pub mod inventory;
/// Line item and order total calculation
pub mod line_items;
/// Fixed-point money amounts
pub mod money;
/// Order and payment number generation
pub mod numbering;
/// Payment reconciliation workflow
pub mod payment;
/// Purchase order lifecycle
pub mod purchase_order;
/// Balance audit and repair
pub mod resync;
