use std::future::Future;

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, U256},
    providers::{DynProvider, Provider},
};
use hb_common::{block::Block, erc20::IERC20};

use crate::{alloy::StringExt, network::Network};

/// Read-only view of a chain, the only I/O boundary of the history engine.
///
/// Implementations hold no per-request state and are shared by every
/// concurrent read of a fetch.
pub trait ChainReader: Send + Sync {
    fn head_block_number(&self) -> impl Future<Output = crate::Result<u64>> + Send;

    /// Fails with `BlockNotFound` if `number` is beyond the chain head.
    fn block(&self, number: u64) -> impl Future<Output = crate::Result<Block>> + Send;

    /// Token balance of `owner` in the token's smallest unit as of `at_block`.
    fn balance_of(
        &self,
        token: Address,
        owner: Address,
        at_block: u64,
    ) -> impl Future<Output = crate::Result<U256>> + Send;

    fn decimals(&self, token: Address) -> impl Future<Output = crate::Result<u8>> + Send;
}

/// `ChainReader` backed by a JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct RpcChainReader {
    provider: DynProvider,
}

impl RpcChainReader {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    pub fn from_rpc_url(rpc_url: &str) -> crate::Result<Self> {
        Ok(Self::new(rpc_url.to_alloy_provider()?))
    }

    pub fn from_network(network: &Network) -> crate::Result<Self> {
        Self::from_rpc_url(&network.get_rpc()?)
    }
}

impl ChainReader for RpcChainReader {
    async fn head_block_number(&self) -> crate::Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| crate::Error::chain_query("eth_blockNumber", e))
    }

    async fn block(&self, number: u64) -> crate::Result<Block> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(|e| crate::Error::chain_query("eth_getBlockByNumber", e))?
            .ok_or(crate::Error::BlockNotFound(number))?;

        Ok(Block::new(block.header.number, block.header.timestamp))
    }

    async fn balance_of(&self, token: Address, owner: Address, at_block: u64) -> crate::Result<U256> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(owner)
            .block(BlockId::number(at_block))
            .call()
            .await
            .map_err(|e| crate::Error::chain_query("balanceOf", e))
    }

    async fn decimals(&self, token: Address) -> crate::Result<u8> {
        IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| crate::Error::chain_query("decimals", e))
    }
}
