pub mod config;
pub mod error;

pub use config::BanterConfig;
pub use error::{BanterError, Result};
