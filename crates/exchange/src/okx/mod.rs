pub mod rest;
pub mod sign;
pub mod types;

pub use rest::OkxClient;
pub use sign::sign;
pub use types::{AccountBalance, BalanceDetail, Instrument, OrderAck, OrderRequest, Ticker};
