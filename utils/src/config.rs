use std::time::Duration;

use alloy::primitives::Address;
use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

use crate::{
    disk_storage::{DiskStorageInterface, FileFormat},
    historic_balances::{DownsampleOptions, FetchOptions, ReadPolicy},
};

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    /// Wallet used when a command does not name one.
    pub wallet: Option<Address>,
    /// Network used when a command does not name one.
    pub network: Option<String>,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
    const FORMAT: FileFormat = FileFormat::TOML;
}

impl Config {
    pub fn get_wallet(&self) -> crate::Result<Address> {
        self.wallet.ok_or(crate::Error::WalletNotSet)
    }

    pub fn set_wallet(address: Address) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.wallet = Some(address);
        config.save()
    }

    pub fn set_network(network: String) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.network = Some(network);
        config.save()
    }
}

/// Tunables of the balance history engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_in_flight: usize,
    pub read_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub downsample_threshold: usize,
    pub downsample_tail: usize,
    /// Offset of the timezone in which days start. Uses the offset of the
    /// machine at the time of the request when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        let downsample = DownsampleOptions::default();
        Self {
            max_in_flight: fetch.max_in_flight,
            read_timeout_ms: fetch.read_policy.timeout.as_millis() as u64,
            max_retries: fetch.read_policy.max_retries,
            retry_backoff_ms: fetch.read_policy.backoff.as_millis() as u64,
            downsample_threshold: downsample.threshold,
            downsample_tail: downsample.tail,
            utc_offset_minutes: None,
        }
    }
}

impl HistoryConfig {
    pub fn utc_offset(&self) -> crate::Result<FixedOffset> {
        match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(crate::Error::InvalidUtcOffset(minutes)),
            None => Ok(Local::now().offset().fix()),
        }
    }

    pub fn fetch_options(&self) -> crate::Result<FetchOptions> {
        Ok(FetchOptions {
            max_in_flight: self.max_in_flight,
            read_policy: ReadPolicy {
                timeout: Duration::from_millis(self.read_timeout_ms),
                max_retries: self.max_retries,
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            utc_offset: self.utc_offset()?,
        })
    }

    pub fn downsample_options(&self) -> DownsampleOptions {
        DownsampleOptions {
            threshold: self.downsample_threshold,
            tail: self.downsample_tail,
        }
    }
}
