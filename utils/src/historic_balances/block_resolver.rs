use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hb_common::block::Block;
use tokio::sync::Mutex;

use super::{chain_reader::ChainReader, read_policy::ReadPolicy};

/// Maps instants to the latest block produced at or before them.
///
/// Blocks read while searching are remembered for the lifetime of the
/// resolver, so searches for neighbouring instants share the upper levels of
/// the search tree. A resolver is meant to live for one fetch.
pub struct BlockResolver<'a, R> {
    reader: &'a R,
    policy: ReadPolicy,
    memo: Mutex<HashMap<u64, Block>>,
}

impl<'a, R: ChainReader> BlockResolver<'a, R> {
    pub fn new(reader: &'a R, policy: ReadPolicy) -> Self {
        Self {
            reader,
            policy,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub async fn head(&self) -> crate::Result<Block> {
        let number = self
            .policy
            .run("head_block_number", || self.reader.head_block_number())
            .await?;
        self.block(number).await
    }

    /// Resolves against the current chain head.
    ///
    /// Returns `None` when `target` predates the genesis block.
    pub async fn resolve_block_at_or_before(
        &self,
        target: DateTime<Utc>,
    ) -> crate::Result<Option<u64>> {
        let head = self.head().await?;
        self.resolve_within(target, &head).await
    }

    /// Resolves against a previously read `head`, searching `[0, head]`.
    ///
    /// A target after the head timestamp has no meaningful answer and is
    /// rejected with `TargetAfterHead` instead of being clamped to the head.
    pub async fn resolve_within(
        &self,
        target: DateTime<Utc>,
        head: &Block,
    ) -> crate::Result<Option<u64>> {
        if head.is_at_or_before(&target) {
            return if head.timestamp_millis() == i128::from(target.timestamp_millis()) {
                Ok(Some(head.number))
            } else {
                Err(crate::Error::TargetAfterHead {
                    target,
                    head: *head,
                })
            };
        }

        // Every block in [0, low) is at or before target, every block in
        // [high, head] is after it.
        let mut low = 0u64;
        let mut high = head.number;

        while low < high {
            let mid = low + (high - low) / 2;
            let block = self.block(mid).await?;

            tracing::trace!(low, high, mid, timestamp = block.timestamp, "bisecting");

            if block.is_at_or_before(&target) {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        Ok(low.checked_sub(1))
    }

    async fn block(&self, number: u64) -> crate::Result<Block> {
        if let Some(block) = self.memo.lock().await.get(&number) {
            return Ok(*block);
        }

        let block = self
            .policy
            .run("block", || self.reader.block(number))
            .await?;
        self.memo.lock().await.insert(number, block);
        Ok(block)
    }
}
