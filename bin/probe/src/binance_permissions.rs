//! Checks what the configured Binance testnet key is allowed to do.

mod report;

use anyhow::Context;
use tracing::info;

use common::{BinanceConfig, OrderSide};
use exchange::binance::{with_retry, RetryPolicy, TestOrder};
use exchange::BinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logging::init();

    let cfg = BinanceConfig::from_env().context("loading Binance configuration")?;
    let client = BinanceClient::from_config(&cfg).context("building Binance client")?;
    info!(base_url = %cfg.base_url, symbol = %cfg.symbol, "Binance permission check starting");

    // ── Account balances ─────────────────────────────────────────────────────
    report::section("Account balances");
    match client.account().await {
        Ok(account) => {
            for b in &account.balances {
                println!("  {}: free {}, locked {}", b.asset, b.free, b.locked);
            }
        }
        Err(e) => report::failure("Balance query", &e),
    }

    // ── Key permissions ──────────────────────────────────────────────────────
    report::section("API key permissions");
    match with_retry(RetryPolicy::default(), "api_permissions", || client.api_permissions()).await
    {
        Ok(perms) => {
            for line in perms.lines() {
                println!("  {line}");
            }
            println!();
            if perms.enable_reading() {
                println!("✓ Reading: enabled (prices and K-lines available)");
            } else {
                println!("✗ Reading: disabled");
            }
            if perms.enable_spot_and_margin_trading() {
                println!("✓ Spot/margin trading: enabled (orders and balances available)");
            } else {
                println!("✗ Spot/margin trading: disabled (the likely cause of order failures)");
            }
            if perms.enable_withdrawals() {
                println!("⚠ Withdrawals: enabled (not recommended for a test key)");
            } else {
                println!("✓ Withdrawals: disabled (recommended)");
            }
            if perms.ip_restrict() {
                println!("  Key is IP-restricted; requests from other addresses are rejected.");
            }
        }
        Err(e) => {
            report::failure("Permission query", &e);
            println!("  The query itself needs permissions; check the key manually on testnet.binance.vision.");
        }
    }

    // ── Read access (unsigned) ───────────────────────────────────────────────
    report::section("Read access");
    match client.ticker_price(&cfg.symbol).await {
        Ok(ticker) => println!("{} price: {} (read access OK)", ticker.symbol, ticker.price),
        Err(e) => report::failure("Ticker query", &e),
    }

    // ── Trade access (signed test order) ─────────────────────────────────────
    report::section("Trade access");
    let order = TestOrder::market(&cfg.symbol, OrderSide::Buy, &cfg.order_quantity);
    match client.test_order(&order).await {
        Ok(_) => println!(
            "Simulated {} {} {} accepted (client order id {})",
            order.side, order.quantity, order.symbol, order.client_order_id
        ),
        Err(e) => {
            report::failure("Test order", &e);
            println!("  Confirm trading permission is enabled and the key is not IP-restricted.");
        }
    }

    Ok(())
}
