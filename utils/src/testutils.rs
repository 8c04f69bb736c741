use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use alloy::primitives::{Address, U256};
use chrono::NaiveDate;
use hb_common::block::Block;

use crate::historic_balances::chain_reader::ChainReader;

pub const SECONDS_PER_DAY: u64 = 86_400;

type BalanceFn = Box<dyn Fn(u64) -> U256 + Send + Sync>;

/// In-memory ledger with deterministic timestamps and scripted failures.
pub struct FakeChain {
    timestamps: Vec<u64>,
    balance_fn: BalanceFn,
    failing_blocks: HashSet<u64>,
    failing_balance_blocks: HashSet<u64>,
    stalled_balance_blocks: HashSet<u64>,
    flaky_balance_reads: AtomicUsize,
    decimals: Option<u8>,
    head_reads: AtomicUsize,
    block_reads: AtomicUsize,
    balance_reads: AtomicUsize,
    in_flight: AtomicUsize,
    peak_block_reads: AtomicUsize,
    peak_balance_reads: AtomicUsize,
}

impl FakeChain {
    pub fn with_timestamps(timestamps: Vec<u64>) -> Self {
        Self {
            timestamps,
            balance_fn: Box::new(|_| U256::ZERO),
            failing_blocks: HashSet::new(),
            failing_balance_blocks: HashSet::new(),
            stalled_balance_blocks: HashSet::new(),
            flaky_balance_reads: AtomicUsize::new(0),
            decimals: Some(18),
            head_reads: AtomicUsize::new(0),
            block_reads: AtomicUsize::new(0),
            balance_reads: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_block_reads: AtomicUsize::new(0),
            peak_balance_reads: AtomicUsize::new(0),
        }
    }

    /// A chain starting at UTC midnight of `genesis_day` with `blocks_per_day`
    /// evenly spaced blocks for `days` days, so UTC midnight of day `k` is
    /// exactly the timestamp of block `k * blocks_per_day`.
    pub fn daily(genesis_day: NaiveDate, days: u64, blocks_per_day: u64) -> Self {
        let genesis = utc_midnight(genesis_day);
        let spacing = SECONDS_PER_DAY / blocks_per_day;
        Self::with_timestamps(
            (0..days * blocks_per_day)
                .map(|n| genesis + n * spacing)
                .collect(),
        )
    }

    pub fn with_balances(mut self, balance_fn: impl Fn(u64) -> U256 + Send + Sync + 'static) -> Self {
        self.balance_fn = Box::new(balance_fn);
        self
    }

    pub fn with_decimals(mut self, decimals: Option<u8>) -> Self {
        self.decimals = decimals;
        self
    }

    /// Every read of block `number` fails with a chain query error.
    pub fn failing_block_at(mut self, number: u64) -> Self {
        self.failing_blocks.insert(number);
        self
    }

    pub fn failing_balance_at(mut self, block: u64) -> Self {
        self.failing_balance_blocks.insert(block);
        self
    }

    pub fn stalled_balance_at(mut self, block: u64) -> Self {
        self.stalled_balance_blocks.insert(block);
        self
    }

    /// The next `count` balance reads fail with a transient error.
    pub fn flaky_balance_reads(self, count: usize) -> Self {
        self.flaky_balance_reads.store(count, Ordering::SeqCst);
        self
    }

    pub fn head_reads(&self) -> usize {
        self.head_reads.load(Ordering::SeqCst)
    }

    pub fn block_reads(&self) -> usize {
        self.block_reads.load(Ordering::SeqCst)
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    pub fn total_reads(&self) -> usize {
        self.head_reads() + self.block_reads() + self.balance_reads()
    }

    /// Highest number of `block` reads observed running at once.
    pub fn peak_block_reads(&self) -> usize {
        self.peak_block_reads.load(Ordering::SeqCst)
    }

    /// Highest number of `balance_of` reads observed running at once.
    pub fn peak_balance_reads(&self) -> usize {
        self.peak_balance_reads.load(Ordering::SeqCst)
    }

    /// Holds a read open for a few scheduler turns so concurrent reads overlap.
    async fn in_flight(&self, peak: &AtomicUsize) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(current, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChainReader for FakeChain {
    async fn head_block_number(&self) -> crate::Result<u64> {
        self.head_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.timestamps.len().saturating_sub(1) as u64)
    }

    async fn block(&self, number: u64) -> crate::Result<Block> {
        self.block_reads.fetch_add(1, Ordering::SeqCst);
        self.in_flight(&self.peak_block_reads).await;

        if self.failing_blocks.contains(&number) {
            return Err(crate::Error::chain_query("eth_getBlockByNumber", "boom"));
        }

        self.timestamps
            .get(number as usize)
            .map(|timestamp| Block::new(number, *timestamp))
            .ok_or(crate::Error::BlockNotFound(number))
    }

    async fn balance_of(&self, _token: Address, _owner: Address, at_block: u64) -> crate::Result<U256> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        self.in_flight(&self.peak_balance_reads).await;

        if self.stalled_balance_blocks.contains(&at_block) {
            return std::future::pending().await;
        }

        let flaky = self
            .flaky_balance_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if flaky || self.failing_balance_blocks.contains(&at_block) {
            Err(crate::Error::chain_query("balanceOf", "execution reverted"))
        } else {
            Ok((self.balance_fn)(at_block))
        }
    }

    async fn decimals(&self, _token: Address) -> crate::Result<u8> {
        self.decimals
            .ok_or_else(|| crate::Error::chain_query("decimals", "function not found"))
    }
}

pub fn utc_midnight(day: NaiveDate) -> u64 {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp() as u64
}

pub fn token() -> Address {
    "0x6b175474e89094c44da98b954eedeac495271d0f".parse().unwrap()
}

pub fn wallet() -> Address {
    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".parse().unwrap()
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
