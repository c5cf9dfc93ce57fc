pub mod alloy;
pub mod balance;
pub mod coingecko;
pub mod config;
pub mod disk_storage;
pub mod error;
pub mod log;
pub mod reqwest;
pub mod serde;

pub use error::{Result, UtilsError as Error};

pub use crate::reqwest::Reqwest;
