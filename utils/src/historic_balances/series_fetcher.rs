use alloy::primitives::Address;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use futures::{stream, StreamExt};
use hb_common::{
    block::Block,
    series::BalanceSample,
    units::{format_balance, DEFAULT_TOKEN_DECIMALS},
};
use tokio_util::sync::CancellationToken;

use super::{
    block_resolver::BlockResolver, chain_reader::ChainReader, day_range, local_midnight,
    read_policy::ReadPolicy, today, DayFailure, SeriesReport,
};
use crate::alloy::parse_required_address;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of chain reads in flight at once.
    pub max_in_flight: usize,
    pub read_policy: ReadPolicy,
    /// Timezone in which days start. One offset is used for the whole range.
    pub utc_offset: FixedOffset,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            read_policy: ReadPolicy::default(),
            utc_offset: Utc.fix(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesRequest {
    pub token: String,
    pub wallet: String,
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    /// Token decimals if already known, otherwise they are read from the chain.
    pub decimals: Option<u8>,
}

impl SeriesRequest {
    pub fn new(token: &str, wallet: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            token: token.to_string(),
            wallet: wallet.to_string(),
            start,
            end,
            decimals: None,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Checks the request without touching the chain, returning the parsed
    /// token and wallet addresses.
    pub fn validate(&self, today: NaiveDate) -> crate::Result<(Address, Address)> {
        let token = parse_required_address(&self.token, crate::Error::MissingTokenAddress)?;
        let wallet = parse_required_address(&self.wallet, crate::Error::MissingWalletAddress)?;

        if self.end < self.start {
            return Err(crate::Error::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }

        if self.end > today {
            return Err(crate::Error::EndDateInFuture {
                end: self.end,
                today,
            });
        }

        Ok((token, wallet))
    }
}

/// Builds the daily balance series of a wallet for one token.
///
/// Every fetch owns its intermediate results; nothing is shared between two
/// fetches except the read-only `ChainReader`.
pub struct BalanceSeriesFetcher<R> {
    reader: R,
    options: FetchOptions,
}

impl<R: ChainReader> BalanceSeriesFetcher<R> {
    pub fn new(reader: R, options: FetchOptions) -> Self {
        Self { reader, options }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub async fn fetch_series(
        &self,
        token: &str,
        wallet: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> crate::Result<SeriesReport> {
        self.fetch(&SeriesRequest::new(token, wallet, start, end))
            .await
    }

    /// Same as [`Self::fetch`], but gives up with `AbortDueToCancel` as soon as
    /// `cancel` fires. Reads still in flight are dropped with the fetch.
    pub async fn fetch_until_cancelled(
        &self,
        request: &SeriesRequest,
        cancel: &CancellationToken,
    ) -> crate::Result<SeriesReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(crate::Error::AbortDueToCancel),
            result = self.fetch(request) => result,
        }
    }

    /// Fetches one sample per day of the request.
    ///
    /// Days which fail are reported in `SeriesReport::failures` without
    /// affecting other days. If no day produced a sample the whole fetch fails
    /// with `AllDaysFailed`.
    ///
    /// The chain head is read once, before any day is searched. When that read
    /// fails no day can be attempted, and its error is returned as is rather
    /// than as `AllDaysFailed`.
    pub async fn fetch(&self, request: &SeriesRequest) -> crate::Result<SeriesReport> {
        let (token, wallet) = request.validate(today(self.options.utc_offset))?;
        let days = day_range(request.start, request.end);

        tracing::info!(
            %token,
            %wallet,
            start = %request.start,
            end = %request.end,
            days = days.len(),
            "fetching balance series"
        );

        let resolver = BlockResolver::new(&self.reader, self.options.read_policy);
        let head = resolver.head().await?;
        let decimals = self.token_decimals(token, request.decimals).await;

        let mut failures = Vec::new();
        let mut resolved = Vec::with_capacity(days.len());

        for (date, resolution) in self.resolve_days(&resolver, &head, &days).await {
            match resolution {
                Ok(block_number) => resolved.push((date, block_number)),
                Err(reason) => failures.push(DayFailure { date, reason }),
            }
        }

        let mut samples = Vec::with_capacity(resolved.len());

        for (date, read) in self
            .read_balances(token, wallet, decimals, &resolved)
            .await
        {
            match read {
                Ok(sample) => samples.push(sample),
                Err(reason) => failures.push(DayFailure { date, reason }),
            }
        }

        samples.sort_by_key(|sample| sample.date);
        failures.sort_by_key(|failure| failure.date);

        for failure in &failures {
            tracing::warn!(date = %failure.date, error = %failure.reason, "no balance sample for day");
        }

        if samples.is_empty() {
            return Err(crate::Error::AllDaysFailed(failures));
        }

        Ok(SeriesReport { samples, failures })
    }

    /// Resolves the block of every day concurrently. The output is in the
    /// order of `days`, whatever order the searches complete in.
    async fn resolve_days(
        &self,
        resolver: &BlockResolver<'_, R>,
        head: &Block,
        days: &[NaiveDate],
    ) -> Vec<(NaiveDate, crate::Result<u64>)> {
        let offset = self.options.utc_offset;

        let mut resolutions = stream::iter(days.iter().copied().enumerate())
            .map(|(index, date)| async move {
                let resolution = async {
                    let target = local_midnight(date, offset)?;
                    resolver
                        .resolve_within(target, head)
                        .await?
                        .ok_or(crate::Error::TargetBeforeGenesis { target })
                };
                (index, date, resolution.await)
            })
            .buffer_unordered(self.concurrency())
            .collect::<Vec<_>>()
            .await;

        resolutions.sort_by_key(|(index, ..)| *index);
        resolutions
            .into_iter()
            .map(|(_, date, resolution)| (date, resolution))
            .collect()
    }

    /// Reads balances for resolved days concurrently, in completion order.
    async fn read_balances(
        &self,
        token: Address,
        wallet: Address,
        decimals: u8,
        resolved: &[(NaiveDate, u64)],
    ) -> Vec<(NaiveDate, crate::Result<BalanceSample>)> {
        stream::iter(resolved.iter().copied())
            .map(|(date, block_number)| async move {
                let sample = self
                    .read_balance(token, wallet, decimals, date, block_number)
                    .await;
                (date, sample)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await
    }

    async fn read_balance(
        &self,
        token: Address,
        wallet: Address,
        decimals: u8,
        date: NaiveDate,
        block_number: u64,
    ) -> crate::Result<BalanceSample> {
        let raw_balance = self
            .options
            .read_policy
            .run("balanceOf", || {
                self.reader.balance_of(token, wallet, block_number)
            })
            .await?;

        Ok(BalanceSample {
            date,
            block_number,
            raw_balance,
            balance: format_balance(raw_balance, decimals)?,
        })
    }

    async fn token_decimals(&self, token: Address, known: Option<u8>) -> u8 {
        if let Some(decimals) = known {
            return decimals;
        }

        match self
            .options
            .read_policy
            .run("decimals", || self.reader.decimals(token))
            .await
        {
            Ok(decimals) => decimals,
            Err(err) => {
                tracing::warn!(
                    %token,
                    error = %err,
                    "token decimals unavailable, assuming {DEFAULT_TOKEN_DECIMALS}"
                );
                DEFAULT_TOKEN_DECIMALS
            }
        }
    }

    fn concurrency(&self) -> usize {
        self.options.max_in_flight.max(1)
    }
}
