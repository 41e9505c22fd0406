pub mod binance;
pub mod okx;

pub use binance::BinanceClient;
pub use okx::OkxClient;
