pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{BinanceConfig, Credentials, OkxConfig};
pub use error::{Error, ErrorKind, Result};
pub use types::*;
