//! Node RPC access with bounded timeouts
//!
//! Every call that can hang is wrapped in a timeout before being
//! awaited, so no request blocks the process indefinitely. The
//! [`NodeApi`] trait is the seam the execution core depends on; the
//! concrete [`NodeClient`] implements it over an ethers HTTP provider.

use crate::config::NetworkConfig;
use crate::error::{classify, ExecutionError, ExecutionResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Raw fee data from one node query.
#[derive(Debug, Clone, Default)]
pub struct NodeFeeData {
    /// Base fee from the latest block, when the chain produces one.
    pub base_fee_per_gas: Option<U256>,
    /// Node-reported legacy gas price, when the sub-query succeeded.
    pub gas_price: Option<U256>,
}

/// Node RPC surface required by the execution core.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Fetch current fee data (latest block base fee + legacy gas price).
    async fn fee_data(&self) -> ExecutionResult<NodeFeeData>;

    /// Transaction count for an address at the latest block.
    async fn transaction_count(&self, address: Address) -> ExecutionResult<u64>;

    /// Broadcast a signed transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> ExecutionResult<H256>;

    /// Receipt for a transaction hash, `None` while unmined.
    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> ExecutionResult<Option<TransactionReceipt>>;

    /// Read-only contract call.
    async fn call(&self, tx: &TypedTransaction) -> ExecutionResult<Bytes>;

    /// Native balance for an address.
    async fn balance(&self, address: Address) -> ExecutionResult<U256>;

    /// Current block number.
    async fn block_number(&self) -> ExecutionResult<u64>;
}

/// HTTP node client for one network.
pub struct NodeClient {
    provider: Provider<Http>,
    rpc_timeout: Duration,
    chain_id: u64,
}

impl NodeClient {
    pub fn new(config: &NetworkConfig) -> ExecutionResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ExecutionError::InvalidNetwork(format!("bad RPC URL: {}", e)))?
            .interval(Duration::from_millis(100));

        Ok(Self {
            provider,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            chain_id: config.chain_id,
        })
    }

    /// Await a provider future under the configured RPC timeout, mapping
    /// both the elapsed timer and transport failures to `NodeUnavailable`.
    async fn bounded<T, E, F>(&self, what: &str, fut: F) -> ExecutionResult<T>
    where
        E: std::fmt::Display,
        F: Future<Output = Result<T, E>> + Send,
    {
        match timeout(self.rpc_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ExecutionError::NodeUnavailable(format!("{}: {}", what, e))),
            Err(_) => Err(ExecutionError::NodeUnavailable(format!(
                "{} timed out after {:?}",
                what, self.rpc_timeout
            ))),
        }
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn fee_data(&self) -> ExecutionResult<NodeFeeData> {
        let block = self
            .bounded("get latest block", self.provider.get_block(BlockNumber::Latest))
            .await?
            .ok_or_else(|| {
                ExecutionError::NodeUnavailable("node returned no latest block".to_string())
            })?;

        // The legacy price is a fallback input; its failure is absorbed
        // here and resolved against the configured minimum upstream.
        let gas_price = match timeout(self.rpc_timeout, self.provider.get_gas_price()).await {
            Ok(Ok(price)) => Some(price),
            _ => None,
        };

        debug!(
            chain_id = self.chain_id,
            base_fee = ?block.base_fee_per_gas,
            gas_price = ?gas_price,
            "fetched fee data"
        );

        Ok(NodeFeeData {
            base_fee_per_gas: block.base_fee_per_gas,
            gas_price,
        })
    }

    async fn transaction_count(&self, address: Address) -> ExecutionResult<u64> {
        let count = self
            .bounded(
                "get transaction count",
                self.provider.get_transaction_count(address, None),
            )
            .await?;
        Ok(count.as_u64())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ExecutionResult<H256> {
        match timeout(self.rpc_timeout, self.provider.send_raw_transaction(raw)).await {
            Ok(Ok(pending)) => Ok(pending.tx_hash()),
            // Broadcast rejections carry actionable markers (insufficient
            // funds, nonce collisions); classify rather than blanket-map.
            Ok(Err(e)) => Err(classify(&e.to_string())),
            Err(_) => Err(ExecutionError::NodeUnavailable(format!(
                "send transaction timed out after {:?}",
                self.rpc_timeout
            ))),
        }
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> ExecutionResult<Option<TransactionReceipt>> {
        self.bounded(
            "get transaction receipt",
            self.provider.get_transaction_receipt(hash),
        )
        .await
    }

    async fn call(&self, tx: &TypedTransaction) -> ExecutionResult<Bytes> {
        self.bounded("contract call", self.provider.call(tx, None)).await
    }

    async fn balance(&self, address: Address) -> ExecutionResult<U256> {
        self.bounded("get balance", self.provider.get_balance(address, None))
            .await
    }

    async fn block_number(&self) -> ExecutionResult<u64> {
        let number = self
            .bounded("get block number", self.provider.get_block_number())
            .await?;
        Ok(number.as_u64())
    }
}
