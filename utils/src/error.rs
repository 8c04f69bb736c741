use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use hb_common::block::Block;

use crate::historic_balances::DayFailure;

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error(transparent)]
    Common(#[from] hb_common::Error),

    #[error("Token address is missing.")]
    MissingTokenAddress,

    #[error("Wallet address is missing.")]
    MissingWalletAddress,

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("End date {end} is before start date {start}.")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("End date {end} cannot be in the future (today is {today}).")]
    EndDateInFuture { end: NaiveDate, today: NaiveDate },

    #[error("UTC offset of {0} minutes is out of range.")]
    InvalidUtcOffset(i32),

    #[error("Midnight of {0} cannot be represented in the configured timezone.")]
    DateOutOfRange(NaiveDate),

    #[error("Block {0} does not exist yet.")]
    BlockNotFound(u64),

    #[error("No block exists at or before {target}, it predates the genesis block.")]
    TargetBeforeGenesis { target: DateTime<Utc> },

    #[error("Target {target} is after the chain head {head}.")]
    TargetAfterHead { target: DateTime<Utc>, head: Block },

    #[error("Chain query '{operation}' failed. (Error: {reason})")]
    ChainQuery {
        operation: &'static str,
        reason: String,
    },

    #[error("Chain query '{operation}' did not respond within {timeout:?}.")]
    ReadTimedOut {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("All {count} requested days failed. (First failure: {first})", count = .0.len(), first = first_reason(.0))]
    AllDaysFailed(Vec<DayFailure>),

    #[error("Aborted because the request was cancelled.")]
    AbortDueToCancel,

    #[error("Network not found: {0}.")]
    NetworkNotFound(String),

    #[error("Rpc URL not found for network {network} with chain id {chain_id}. Please add it in the networks.")]
    RpcUrlNotFound { network: String, chain_id: u32 },

    #[error("Token '{token}' is not listed on network {network}, pass its contract address instead.")]
    TokenNotFound { token: String, network: String },

    #[error("No wallet given and no default wallet set in config.")]
    WalletNotSet,

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Formatting to json format failed. (Error: {0:?})")]
    JsonFormattingFailed(serde_json::Error),

    #[error("Parsing the yaml file failed: {0}. (Error: {1:?})")]
    YamlParsingFailed(PathBuf, serde_yaml::Error),

    #[error("Formatting to yaml format failed: {0}. (Error: {1:?})")]
    YamlFormattingFailed(String, serde_yaml::Error),
}

fn first_reason(failures: &[DayFailure]) -> String {
    failures
        .first()
        .map(|failure| failure.to_string())
        .unwrap_or_else(|| "none recorded".to_string())
}

impl UtilsError {
    pub fn chain_query(operation: &'static str, error: impl std::fmt::Display) -> Self {
        Self::ChainQuery {
            operation,
            reason: error.to_string(),
        }
    }

    /// Errors caused by the request itself, detected before touching the chain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingTokenAddress
                | Self::MissingWalletAddress
                | Self::InvalidAddress(_)
                | Self::InvalidDateRange { .. }
                | Self::EndDateInFuture { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BlockNotFound(_)
                | Self::DateOutOfRange(_)
                | Self::TargetBeforeGenesis { .. }
                | Self::TargetAfterHead { .. }
        )
    }

    /// Transient chain failures which may succeed if the read is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainQuery { .. } | Self::ReadTimedOut { .. })
    }
}
