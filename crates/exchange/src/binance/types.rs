use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::OrderSide;

/// Error body returned by Binance on any non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: i64,
    pub msg: String,
}

/// Clock difference beyond which signed requests start failing with -1021.
pub const MAX_CLOCK_DRIFT_MS: i64 = 1_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: i64,
}

impl ServerTime {
    /// Local minus server time.
    pub fn drift_ms(&self, local_ms: i64) -> i64 {
        local_ms - self.server_time
    }

    /// Console warning when `drift_ms` exceeds [`MAX_CLOCK_DRIFT_MS`].
    pub fn drift_warning(&self, local_ms: i64) -> Option<String> {
        let drift = self.drift_ms(local_ms);
        (drift.abs() > MAX_CLOCK_DRIFT_MS).then(|| {
            format!(
                "Warning: local clock is {drift}ms off the server. \
                 Enable automatic time sync in the OS date/time settings."
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub can_trade: bool,
    #[serde(default)]
    pub can_withdraw: bool,
    #[serde(default)]
    pub can_deposit: bool,
    pub balances: Vec<AssetBalance>,
}

impl AccountInfo {
    /// Balances with a positive free or locked amount.
    pub fn non_zero_balances(&self) -> Vec<&AssetBalance> {
        self.balances.iter().filter(|b| !b.is_empty()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

impl AssetBalance {
    pub fn free_amount(&self) -> f64 {
        self.free.parse().unwrap_or(0.0)
    }

    pub fn locked_amount(&self) -> f64 {
        self.locked.parse().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.free_amount() <= 0.0 && self.locked_amount() <= 0.0
    }
}

/// API key restriction flags. All returned fields are kept so they can be
/// listed verbatim; the typed accessors cover the flags that matter here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ApiPermissions {
    pub fields: BTreeMap<String, Value>,
}

impl ApiPermissions {
    fn flag(&self, name: &str) -> bool {
        self.fields.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn enable_reading(&self) -> bool {
        self.flag("enableReading")
    }

    pub fn enable_spot_and_margin_trading(&self) -> bool {
        self.flag("enableSpotAndMarginTrading")
    }

    pub fn enable_withdrawals(&self) -> bool {
        self.flag("enableWithdrawals")
    }

    pub fn ip_restrict(&self) -> bool {
        self.flag("ipRestrict")
    }

    /// `key: value` lines for display; strings are printed without quotes.
    pub fn lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymbolPrice {
    pub symbol: String,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub symbol: String,
    pub id: u64,
    pub order_id: u64,
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub quote_qty: String,
    #[serde(default)]
    pub commission: String,
    #[serde(default)]
    pub commission_asset: String,
    pub time: i64,
    pub is_buyer: bool,
    #[serde(default)]
    pub is_maker: bool,
}

/// Market order validated by `/api/v3/order/test`; never reaches the matching engine.
#[derive(Debug, Clone)]
pub struct TestOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: String,
    pub client_order_id: String,
}

impl TestOrder {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity: quantity.into(),
            client_order_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", self.quantity.clone()),
            ("newClientOrderId", self.client_order_id.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_balances_are_filtered() {
        let info: AccountInfo = serde_json::from_str(
            r#"{"canTrade":true,"balances":[
                {"asset":"BTC","free":"1.00000000","locked":"0.00000000"},
                {"asset":"ETH","free":"0.00000000","locked":"0.00000000"},
                {"asset":"USDT","free":"0.00000000","locked":"5.00000000"}
            ]}"#,
        )
        .unwrap();
        let assets: Vec<_> = info.non_zero_balances().iter().map(|b| b.asset.as_str()).collect();
        assert_eq!(assets, vec!["BTC", "USDT"]);
    }

    #[test]
    fn permission_flags_default_to_false() {
        let perms: ApiPermissions = serde_json::from_str(
            r#"{"ipRestrict":false,"enableReading":true,"enableWithdrawals":false,"createTime":1698645219000}"#,
        )
        .unwrap();
        assert!(perms.enable_reading());
        assert!(!perms.enable_spot_and_margin_trading());
        assert!(!perms.enable_withdrawals());
        assert_eq!(perms.fields.len(), 4);
    }

    #[test]
    fn permission_lines_print_strings_unquoted() {
        let perms: ApiPermissions = serde_json::from_str(
            r#"{"enableReading":true,"tradingAuthorityExpirationTime":"never","createTime":1698645219000}"#,
        )
        .unwrap();
        assert_eq!(
            perms.lines(),
            vec![
                "createTime: 1698645219000".to_string(),
                "enableReading: true".to_string(),
                "tradingAuthorityExpirationTime: never".to_string(),
            ]
        );
    }

    #[test]
    fn drift_warning_only_past_threshold() {
        let t = ServerTime { server_time: 1_690_000_000_000 };
        assert_eq!(t.drift_ms(1_690_000_000_250), 250);
        assert!(t.drift_warning(1_690_000_001_000).is_none());

        let ahead = t.drift_warning(1_690_000_001_500).unwrap();
        assert!(ahead.contains("1500ms"));
        assert!(ahead.contains("automatic time sync"));
        assert!(t.drift_warning(1_689_999_998_000).is_some());
    }

    #[test]
    fn test_order_params_are_market_orders() {
        let order = TestOrder::market("BTCUSDT", OrderSide::Buy, "0.001");
        let params = order.params();
        assert!(params.contains(&("type", "MARKET".to_string())));
        assert!(params.contains(&("side", "BUY".to_string())));
        assert_eq!(order.client_order_id.len(), 32);
    }
}
