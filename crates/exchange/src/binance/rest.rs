use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::debug;
use url::form_urlencoded;

use common::{BinanceConfig, Credentials, Error, Kline, Result};

use super::types::{
    AccountInfo, ApiError, ApiPermissions, ServerTime, SymbolPrice, TestOrder, Trade,
};

/// Largest page `/api/v3/klines` returns.
const KLINE_PAGE_LIMIT: usize = 1000;

/// Hex HMAC-SHA256 of a url-encoded query string, as Binance expects in `signature`.
pub fn sign_query(secret: &str, query: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// REST client for the Binance spot API (testnet by default).
pub struct BinanceClient {
    credentials: Credentials,
    base_url: String,
    recv_window: u64,
    http: Client,
}

impl BinanceClient {
    pub fn new(
        credentials: Credentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().use_rustls_tls().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            recv_window: 10_000,
            http,
        })
    }

    pub fn from_config(cfg: &BinanceConfig) -> Result<Self> {
        Ok(Self::new(cfg.credentials.clone(), &cfg.base_url, cfg.http_timeout)?
            .with_recv_window(cfg.recv_window))
    }

    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    fn encode(params: &[(&str, String)]) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish()
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = Self::encode(params);
        let url = if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        };

        debug!(method = "GET", path, "Binance public request");
        let resp = self.http.get(&url).send().await?;
        Self::parse(resp).await
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut params = params.to_vec();
        params.push(("recvWindow", self.recv_window.to_string()));
        params.push(("timestamp", Self::timestamp_ms().to_string()));

        let query = Self::encode(&params);
        let signature = sign_query(&self.credentials.secret, &query);
        let signed = format!("{query}&signature={signature}");

        debug!(method = %method, path, "Binance signed request");
        let request = if method == Method::GET {
            self.http
                .get(format!("{}{path}?{signed}", self.base_url))
        } else {
            self.http
                .request(method, format!("{}{path}", self.base_url))
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(signed)
        };

        let resp = request
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), "Binance response");

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => Error::Binance {
                    code: api.code,
                    msg: api.msg,
                },
                Err(_) => Error::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                },
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn server_time(&self) -> Result<ServerTime> {
        self.public_get("/api/v3/time", &[]).await
    }

    pub async fn account(&self) -> Result<AccountInfo> {
        self.signed(Method::GET, "/api/v3/account", &[]).await
    }

    pub async fn api_permissions(&self) -> Result<ApiPermissions> {
        self.signed(Method::GET, "/sapi/v1/account/apiRestrictions", &[])
            .await
    }

    pub async fn ticker_price(&self, symbol: &str) -> Result<SymbolPrice> {
        self.public_get("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await
    }

    pub async fn my_trades(&self, symbol: &str, limit: u16) -> Result<Vec<Trade>> {
        let params = [("symbol", symbol.to_string()), ("limit", limit.to_string())];
        self.signed(Method::GET, "/api/v3/myTrades", &params).await
    }

    /// Validate a market order without sending it to the matching engine.
    /// Binance answers `{}` on success.
    pub async fn test_order(&self, order: &TestOrder) -> Result<serde_json::Value> {
        debug!(symbol = %order.symbol, side = %order.side, qty = %order.quantity, "Submitting test order");
        self.signed(Method::POST, "/api/v3/order/test", &order.params())
            .await
    }

    /// One page of candles starting at `start_ms`.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        limit: usize,
    ) -> Result<Vec<Kline>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start_ms.to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<Vec<serde_json::Value>> = self.public_get("/api/v3/klines", &params).await?;
        rows.iter().map(|row| Kline::from_row(row)).collect()
    }

    /// Every candle from `now - lookback` until now, paging as needed.
    pub async fn historical_klines(
        &self,
        symbol: &str,
        interval: &str,
        lookback: chrono::Duration,
    ) -> Result<Vec<Kline>> {
        let mut start_ms = (Utc::now() - lookback).timestamp_millis();
        let mut all = Vec::new();

        loop {
            let page = self.klines(symbol, interval, start_ms, KLINE_PAGE_LIMIT).await?;
            let full = page.len() == KLINE_PAGE_LIMIT;
            match page.last() {
                Some(last) => start_ms = last.open_time.timestamp_millis() + 1,
                None => break,
            }
            all.extend(page);
            if !full {
                break;
            }
        }

        debug!(symbol, interval, count = all.len(), "Fetched historical klines");
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_binance_reference_example() {
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign_query(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn params_are_url_encoded_in_order() {
        let encoded = BinanceClient::encode(&[
            ("symbol", "BTCUSDT".to_string()),
            ("note", "a b&c".to_string()),
        ]);
        assert_eq!(encoded, "symbol=BTCUSDT&note=a+b%26c");
    }
}
