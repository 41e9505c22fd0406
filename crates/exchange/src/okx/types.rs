use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::OrderSide;

/// Every v5 REST response: `code == "0"` on success, payload in `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl Envelope {
    /// Per-item failure detail (`sCode`/`sMsg`) from the first data entry, if any.
    pub fn item_error(&self) -> Option<(String, String)> {
        let first = self.data.first()?;
        let code = first.get("sCode")?.as_str()?;
        if code.is_empty() || code == "0" {
            return None;
        }
        let msg = first.get("sMsg").and_then(Value::as_str).unwrap_or_default();
        Some((code.to_string(), msg.to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountBalance {
    pub total_eq: String,
    pub u_time: String,
    pub details: Vec<BalanceDetail>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceDetail {
    pub ccy: String,
    pub eq: String,
    pub cash_bal: String,
    pub avail_bal: String,
    pub frozen_bal: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ticker {
    pub inst_type: String,
    pub inst_id: String,
    pub last: String,
    pub ask_px: String,
    pub bid_px: String,
    pub open24h: String,
    pub high24h: String,
    pub low24h: String,
    pub vol24h: String,
    pub ts: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instrument {
    pub inst_type: String,
    pub inst_id: String,
    pub base_ccy: String,
    pub quote_ccy: String,
    pub tick_sz: String,
    pub lot_sz: String,
    pub min_sz: String,
    pub state: String,
}

/// Body of `POST /api/v5/trade/order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub inst_id: String,
    pub td_mode: String,
    pub side: String,
    pub ord_type: String,
    pub sz: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cl_ord_id: Option<String>,
}

impl OrderRequest {
    /// Spot market order in cash mode.
    pub fn market(inst_id: impl Into<String>, side: OrderSide, sz: impl Into<String>) -> Self {
        Self {
            inst_id: inst_id.into(),
            td_mode: "cash".to_string(),
            side: side.to_string().to_lowercase(),
            ord_type: "market".to_string(),
            sz: sz.into(),
            cl_ord_id: Some(uuid::Uuid::new_v4().simple().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderAck {
    pub ord_id: String,
    pub cl_ord_id: String,
    pub tag: String,
    pub s_code: String,
    pub s_msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_serializes_okx_field_names() {
        let order = OrderRequest::market("BTC-USDT", OrderSide::Buy, "0.001");
        let body = serde_json::to_value(&order).unwrap();
        assert_eq!(body["instId"], "BTC-USDT");
        assert_eq!(body["tdMode"], "cash");
        assert_eq!(body["side"], "buy");
        assert_eq!(body["ordType"], "market");
        assert_eq!(body["sz"], "0.001");
        assert_eq!(body["clOrdId"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn ticker_reads_24h_fields() {
        let t: Ticker = serde_json::from_str(
            r#"{"instId":"BTC-USDT","last":"29000.1","open24h":"28000","vol24h":"1234","ts":"1690000000000"}"#,
        )
        .unwrap();
        assert_eq!(t.last, "29000.1");
        assert_eq!(t.open24h, "28000");
        assert_eq!(t.vol24h, "1234");
    }

    #[test]
    fn item_error_surfaces_failed_order() {
        let env: Envelope = serde_json::from_str(
            r#"{"code":"1","msg":"All operations failed","data":[{"ordId":"","sCode":"51008","sMsg":"Insufficient balance"}]}"#,
        )
        .unwrap();
        assert_eq!(
            env.item_error(),
            Some(("51008".to_string(), "Insufficient balance".to_string()))
        );
    }
}
