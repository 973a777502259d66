//! Tradewatch CLI - authenticate against the trader API and print account
//! and recent-order summaries.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradewatch::api::{ApiClient, DEFAULT_MAX_RESULTS};
use tradewatch::auth::{Credentials, EnvStore, Session, StdinPrompt, DEFAULT_MAX_AGE_DAYS};
use tradewatch::models::OrderSummary;
use tradewatch::utils::render_table;

// ============================================================================
// Constants
// ============================================================================

/// Env var overriding the credential store location
const STORE_PATH_VAR: &str = "TRADEWATCH_ENV";

/// Lookback for the default order summary
const RECENT_ORDER_DAYS: i64 = 30;

/// Lookback for the filled-orders summary
const FILLED_ORDER_DAYS: i64 = 60;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn store_path() -> Result<PathBuf> {
    match std::env::var(STORE_PATH_VAR) {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => EnvStore::default_path(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    info!("tradewatch starting");

    let store = EnvStore::new(store_path()?);
    let credentials = Credentials::from_store(&store).with_context(|| {
        format!(
            "Credential store {} needs APP_KEY, APP_SECRET, APP_CALLBACK_URL and BASE_URL",
            store.path().display()
        )
    })?;

    let mut session = Session::new(
        credentials.clone(),
        store,
        reqwest::Client::new(),
        Box::new(StdinPrompt),
    )?;
    session.ensure_authenticated(false, DEFAULT_MAX_AGE_DAYS).await?;

    let api = ApiClient::new(&credentials.base_url, session.headers()?)?;

    let accounts = api.fetch_account_numbers().await?;
    println!("\nAccounts");
    for account in &accounts {
        println!("  {}  (encrypted id {})", account.account_number, account.hash_value);
    }

    let Some(first) = accounts.first() else {
        println!("\nNo linked accounts.");
        return Ok(());
    };

    print_orders(&api, &first.hash_value, RECENT_ORDER_DAYS, None).await?;
    print_orders(&api, &first.hash_value, FILLED_ORDER_DAYS, Some("FILLED")).await?;

    info!("tradewatch done");
    Ok(())
}

async fn print_orders(
    api: &ApiClient,
    account_hash: &str,
    days: i64,
    status: Option<&str>,
) -> Result<()> {
    let orders = api
        .fetch_orders(account_hash, days, DEFAULT_MAX_RESULTS, status)
        .await?;

    match status {
        Some(status) => println!("\n{} orders, last {} days", status, days),
        None => println!("\nOrders, last {} days", days),
    }

    if orders.is_empty() {
        println!("No orders found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|order| OrderSummary::from_order(order).row())
        .collect();
    println!("{}", render_table(&OrderSummary::HEADERS, &rows));
    Ok(())
}
