//! Exercises the OKX v5 REST API in demo-trading mode.

mod report;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use common::{OkxConfig, OrderSide};
use exchange::okx::OrderRequest;
use exchange::OkxClient;

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logging::init();

    let cfg = OkxConfig::from_env().context("loading OKX configuration")?;
    let client = OkxClient::from_config(&cfg).context("building OKX client")?;
    info!(base_url = %cfg.base_url, simulated = cfg.simulated, "OKX client ready");

    report::section("1. Demo account balance");
    match client.balance().await {
        Ok(balance) => println!("{}", pretty(&balance)),
        Err(e) => report::failure("Balance query", &e),
    }

    report::section("2. BTC-USDT ticker");
    match client.ticker("BTC-USDT").await {
        Ok(ticker) => println!("{}", pretty(&ticker)),
        Err(e) => report::failure("Ticker query", &e),
    }

    report::section("3. ETH-USDT hourly K-lines (latest 10)");
    match client.history_candles("ETH-USDT", "1H", 10).await {
        Ok(candles) => {
            println!("time (UTC), open, high, low, close, volume");
            for k in &candles {
                println!("  {k}");
            }
        }
        Err(e) => report::failure("K-line query", &e),
    }

    report::section("4. Spot instruments (first 5)");
    match client.instruments("SPOT", None).await {
        Ok(list) => println!("{}", pretty(&list.iter().take(5).collect::<Vec<_>>())),
        Err(e) => report::failure("Instrument query", &e),
    }

    report::section("5. Demo market buy of 0.001 BTC-USDT");
    let order = OrderRequest::market("BTC-USDT", OrderSide::Buy, "0.001");
    match client.place_order(&order).await {
        Ok(acks) => println!("{}", pretty(&acks)),
        Err(e) => report::failure("Order placement", &e),
    }

    Ok(())
}
