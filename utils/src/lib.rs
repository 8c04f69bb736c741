pub mod alloy;
pub mod config;
pub mod disk_storage;
pub mod error;
pub mod historic_balances;
pub mod network;

#[cfg(test)]
mod testutils;

pub use error::{Result, UtilsError as Error};
