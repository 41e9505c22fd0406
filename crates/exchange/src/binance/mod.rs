pub mod rest;
pub mod retry;
pub mod types;

pub use rest::{sign_query, BinanceClient};
pub use retry::{with_retry, RetryPolicy};
pub use types::{
    AccountInfo, ApiPermissions, AssetBalance, ServerTime, SymbolPrice, TestOrder, Trade,
    MAX_CLOCK_DRIFT_MS,
};
