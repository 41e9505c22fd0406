use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One candlestick. Both Binance and OKX rows start with
/// `[open_time_ms, open, high, low, close, volume, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Kline {
    /// Map a raw exchange row. Fields may be JSON numbers or numeric strings;
    /// trailing columns are ignored.
    pub fn from_row(row: &[Value]) -> Result<Self> {
        if row.len() < 6 {
            return Err(Error::Other(format!(
                "K-line row has {} columns, expected at least 6",
                row.len()
            )));
        }

        let ms = as_i64(&row[0], "open_time")?;
        let open_time = Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| Error::Other(format!("K-line timestamp out of range: {ms}")))?;

        Ok(Kline {
            open_time,
            open: as_f64(&row[1], "open")?,
            high: as_f64(&row[2], "high")?,
            low: as_f64(&row[3], "low")?,
            close: as_f64(&row[4], "close")?,
            volume: as_f64(&row[5], "volume")?,
        })
    }

    /// Open time as `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn time_utc(&self) -> String {
        self.open_time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl fmt::Display for Kline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time: {} UTC, open: {}, high: {}, low: {}, close: {}, volume: {}",
            self.time_utc(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume
        )
    }
}

fn as_i64(value: &Value, field: &str) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::Other(format!("K-line field '{field}' is not an integer: {value}")))
}

fn as_f64(value: &Value, field: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::Other(format!("K-line field '{field}' is not a number: {value}")))
}
