use alloy::primitives::{utils::UnitsError, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to format amount {amount} with {decimals} decimals. (Error: {error})")]
    FormatUnitsFailed {
        amount: U256,
        decimals: u8,
        error: UnitsError,
    },
}
