#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use po_reconcile::{
    config::{
        database,
        settings::{self, DEFAULT_CONFIG_PATH},
    },
    core::{purchase_order, resync},
    errors::Result,
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 2. Load settings; CONFIG_PATH overrides the default location
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = settings::load_config_or_default(&config_path)?;

    // 3. Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();
    info!(path = %config_path, "Loaded configuration");

    // 4. Connect and prepare the schema
    let db = database::create_connection(&config.database_url)
        .await
        .inspect(|_| info!("Database connected"))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;

    if config.create_schema {
        database::create_tables(&db)
            .await
            .inspect_err(|e| error!("Failed to create tables: {}", e))?;
    }

    // 5. Repair any stored balances that drifted from their payments
    if config.resync_on_startup {
        let report = resync::resync_order_balances(&db).await?;
        info!("{}", resync::format_resync_summary(&report));
    }

    // 6. Summarize what is still owed
    let outstanding =
        purchase_order::get_outstanding_orders(&db, Some(config.outstanding_limit)).await?;
    info!(count = outstanding.len(), "Outstanding orders");
    for order in &outstanding {
        info!(
            po_number = %order.po_number,
            order_date = %order.order_date,
            total = %order.total_amount,
            paid = %order.amount_paid,
            due = %order.balance_due,
            status = ?order.payment_status,
            "Outstanding order"
        );
    }

    Ok(())
}
