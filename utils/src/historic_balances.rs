//! Reconstructs the balance history of a wallet for an ERC-20 token.
//!
//! For every calendar day of a range the last block produced at or before
//! local midnight is located by bisecting the chain, the token balance is read
//! at that block, and the samples are assembled into a chronological series.
//! Dense series can be reduced for charts with [`downsample`].

pub mod block_resolver;
pub mod chain_reader;
pub mod downsampler;
pub mod read_policy;
pub mod series_fetcher;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use hb_common::series::BalanceSample;

pub use block_resolver::BlockResolver;
pub use chain_reader::{ChainReader, RpcChainReader};
pub use downsampler::{downsample, DownsampleOptions};
pub use read_policy::ReadPolicy;
pub use series_fetcher::{BalanceSeriesFetcher, FetchOptions};

/// Chronological balance samples, one per successfully resolved day.
pub type Series = Vec<BalanceSample>;

/// A day of the requested range for which no sample could be produced.
#[derive(Debug)]
pub struct DayFailure {
    pub date: NaiveDate,
    pub reason: crate::Error,
}

impl Display for DayFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.date, self.reason)
    }
}

/// Outcome of a fetch which produced at least one sample.
#[derive(Debug, Default)]
pub struct SeriesReport {
    pub samples: Series,
    /// Days without a sample, ordered by date.
    pub failures: Vec<DayFailure>,
}

impl SeriesReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Every day of `[start, end]`, both inclusive, in order.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// The instant at which `day` begins in the timezone at `offset`.
///
/// Fails with `DateOutOfRange` at the edges of the calendar, where the
/// instant falls outside what `DateTime` can hold.
pub fn local_midnight(day: NaiveDate, offset: FixedOffset) -> crate::Result<DateTime<Utc>> {
    day.and_time(NaiveTime::MIN)
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
        .map(|utc| utc.and_utc())
        .ok_or(crate::Error::DateOutOfRange(day))
}

pub fn today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}
