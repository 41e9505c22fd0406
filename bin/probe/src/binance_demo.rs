//! Walks the Binance testnet through balances, permissions, trades, a test
//! order and a day of hourly K-lines rendered to PNG.

mod report;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use tracing::{info, warn};

use common::{BinanceConfig, OrderSide};
use exchange::binance::{with_retry, RetryPolicy, TestOrder, MAX_CLOCK_DRIFT_MS};
use exchange::BinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logging::init();

    let cfg = BinanceConfig::from_env().context("loading Binance configuration")?;
    let client = BinanceClient::from_config(&cfg).context("building Binance client")?;
    let retry = RetryPolicy::default();
    info!(base_url = %cfg.base_url, recv_window = cfg.recv_window, "Binance client ready");

    // ── Clock sync ───────────────────────────────────────────────────────────
    report::section("Server time");
    match client.server_time().await {
        Ok(t) => {
            let local = Utc::now().timestamp_millis();
            if let Some(server) = Utc.timestamp_millis_opt(t.server_time).single() {
                println!("Server time: {} (UTC)", server.format("%Y-%m-%d %H:%M:%S%.3f"));
            }
            println!("Local - server: {}ms (ideally < {MAX_CLOCK_DRIFT_MS}ms)", t.drift_ms(local));
            if let Some(warning) = t.drift_warning(local) {
                warn!(diff_ms = t.drift_ms(local), "Local clock drift is large");
                println!("{warning}");
            }
        }
        Err(e) => report::failure("Time sync check", &e),
    }

    // ── Balances ─────────────────────────────────────────────────────────────
    report::section("Simulated account balances");
    match with_retry(retry, "account", || client.account()).await {
        Ok(account) => {
            let balances = account.non_zero_balances();
            if balances.is_empty() {
                println!("No funded assets. Use the faucet on testnet.binance.vision to get test funds.");
            }
            for b in balances {
                println!("  {}: free {}, locked {}", b.asset, b.free, b.locked);
            }
        }
        Err(e) => report::failure("Balance query", &e),
    }

    // ── Permissions ──────────────────────────────────────────────────────────
    report::section("API key permissions");
    match with_retry(retry, "api_permissions", || client.api_permissions()).await {
        Ok(perms) => println!("{}", serde_json::to_string_pretty(&perms)?),
        Err(e) => {
            report::failure("Permission query", &e);
            println!("  Check the key manually on testnet.binance.vision ('Trade' should be enabled).");
        }
    }

    // ── Trade history ────────────────────────────────────────────────────────
    report::section(&format!("Last 5 trades on {}", cfg.symbol));
    match with_retry(retry, "my_trades", || client.my_trades(&cfg.symbol, 5)).await {
        Ok(trades) if trades.is_empty() => {
            println!("No trade history yet; place a simulated order first.")
        }
        Ok(trades) => {
            for t in trades {
                let side = if t.is_buyer { "BUY" } else { "SELL" };
                println!(
                    "  #{} order {} {side} {} @ {} (fee {} {})",
                    t.id, t.order_id, t.qty, t.price, t.commission, t.commission_asset
                );
            }
        }
        Err(e) => report::failure("Trade history query", &e),
    }

    // ── Ticker ───────────────────────────────────────────────────────────────
    report::section("Latest price");
    match with_retry(retry, "ticker_price", || client.ticker_price(&cfg.symbol)).await {
        Ok(ticker) => println!("{} price: {}", ticker.symbol, ticker.price),
        Err(e) => report::failure("Price query", &e),
    }

    // ── Simulated order ──────────────────────────────────────────────────────
    report::section("Simulated market buy");
    let order = TestOrder::market(&cfg.symbol, OrderSide::Buy, &cfg.order_quantity);
    match with_retry(retry, "test_order", || client.test_order(&order)).await {
        Ok(ack) => println!("Test order accepted: {ack}"),
        Err(e) => report::failure("Test order", &e),
    }

    // ── K-lines and chart ────────────────────────────────────────────────────
    report::section("Hourly K-lines, last 24 hours");
    let klines = with_retry(retry, "historical_klines", || {
        client.historical_klines(&cfg.symbol, "1h", chrono::Duration::days(1))
    })
    .await;
    match klines {
        Ok(klines) => {
            for k in klines.iter().take(10) {
                println!("  {k}");
            }
            let title = format!("{} 1-Hour Close Price (Last 24 Hours)", cfg.symbol);
            let y_desc = if cfg.symbol.ends_with("USDT") { "Price (USDT)" } else { "Price" };
            match chart::render_close_prices(&klines, &title, y_desc, &cfg.chart_path) {
                Ok(()) => println!("Chart saved to {}", cfg.chart_path),
                Err(e) => report::failure("Chart rendering", &e),
            }
        }
        Err(e) => report::failure("K-line query", &e),
    }

    Ok(())
}
