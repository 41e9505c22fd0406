use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use common::{Credentials, Error, Kline, OkxConfig, Result};

use super::sign::sign;
use super::types::{AccountBalance, Envelope, Instrument, OrderAck, OrderRequest, Ticker};

const API_PREFIX: &str = "/api/v5";

/// Signed REST client for the OKX v5 API.
pub struct OkxClient {
    credentials: Credentials,
    base_url: String,
    /// Adds `x-simulated-trading: 1` so requests hit the demo-trading account.
    simulated: bool,
    http: Client,
}

impl OkxClient {
    pub fn new(
        credentials: Credentials,
        base_url: impl Into<String>,
        simulated: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().use_rustls_tls().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            simulated,
            http,
        })
    }

    pub fn from_config(cfg: &OkxConfig) -> Result<Self> {
        Self::new(
            cfg.credentials.clone(),
            &cfg.base_url,
            cfg.simulated,
            cfg.http_timeout,
        )
    }

    fn timestamp_ms() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string()
    }

    /// `/api/v5{path}` plus the encoded query, exactly as signed and sent.
    fn request_path(path: &str, params: &[(&str, String)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        if query.is_empty() {
            format!("{API_PREFIX}{path}")
        } else {
            format!("{API_PREFIX}{path}?{query}")
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> Result<Vec<T>> {
        let request_path = Self::request_path(path, params);
        let body = body.unwrap_or_default();
        let timestamp = Self::timestamp_ms();
        let signature = sign(
            &self.credentials.secret,
            &timestamp,
            method.as_str(),
            &request_path,
            &body,
        );

        debug!(method = %method, path = %request_path, "OKX request");
        let mut request = self
            .http
            .request(method.clone(), format!("{}{request_path}", self.base_url))
            .header("Content-Type", "application/json")
            .header("OK-ACCESS-KEY", &self.credentials.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", &timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.credentials.passphrase);
        if self.simulated {
            request = request.header("x-simulated-trading", "1");
        }
        if method != Method::GET {
            request = request.body(body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), "OKX response");

        // OKX returns its envelope on 4xx as well; only fall back to the raw
        // status when the body is not an envelope.
        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(env) => env,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(Error::UnexpectedStatus {
                    status: status.as_u16(),
                    body: text,
                })
            }
        };

        if envelope.code != "0" {
            let (code, msg) = match envelope.item_error() {
                Some((s_code, s_msg)) => (s_code, format!("{} ({s_msg})", envelope.msg)),
                None => (envelope.code.clone(), envelope.msg.clone()),
            };
            return Err(Error::Okx { code, msg });
        }

        envelope
            .data
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }

    pub async fn balance(&self) -> Result<Vec<AccountBalance>> {
        self.request(Method::GET, "/account/balance", &[], None).await
    }

    pub async fn ticker(&self, inst_id: &str) -> Result<Ticker> {
        let params = [("instId", inst_id.to_string())];
        self.request(Method::GET, "/market/ticker", &params, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other(format!("No ticker returned for {inst_id}")))
    }

    /// Most recent `limit` candles (max 100), newest first as OKX returns them.
    pub async fn history_candles(&self, inst_id: &str, bar: &str, limit: u32) -> Result<Vec<Kline>> {
        let params = [
            ("instId", inst_id.to_string()),
            ("bar", bar.to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<Vec<Value>> = self
            .request(Method::GET, "/market/history-candles", &params, None)
            .await?;
        rows.iter().map(|row| Kline::from_row(row)).collect()
    }

    pub async fn instruments(&self, inst_type: &str, inst_id: Option<&str>) -> Result<Vec<Instrument>> {
        let mut params = vec![("instType", inst_type.to_string())];
        if let Some(id) = inst_id {
            params.push(("instId", id.to_string()));
        }
        self.request(Method::GET, "/public/instruments", &params, None)
            .await
    }

    pub async fn place_order(&self, order: &OrderRequest) -> Result<Vec<OrderAck>> {
        let body = serde_json::to_string(order)?;
        debug!(inst_id = %order.inst_id, side = %order.side, sz = %order.sz, "Placing OKX order");
        self.request(Method::POST, "/trade/order", &[], Some(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_includes_prefix_and_query() {
        assert_eq!(OkxClient::request_path("/account/balance", &[]), "/api/v5/account/balance");
        assert_eq!(
            OkxClient::request_path(
                "/market/history-candles",
                &[("instId", "ETH-USDT".into()), ("bar", "1H".into()), ("limit", "10".into())]
            ),
            "/api/v5/market/history-candles?instId=ETH-USDT&bar=1H&limit=10"
        );
    }
}
