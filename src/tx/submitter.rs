//! Transaction submission and confirmation
//!
//! Single-attempt execution primitive: build with a fresh nonce, sign
//! through the resolved signer, broadcast once, then wait for
//! inclusion raced against a bounded timer. Broadcast failures are
//! terminal; retrying with a stale intent risks duplicate submission,
//! so nothing here ever re-sends.

use crate::chain::provider::NodeApi;
use crate::error::{ExecutionError, ExecutionResult};
use crate::tx::gas::GasOptions;
use crate::wallet::SignerHandle;

use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What the caller wants executed; fee fields already resolved.
#[derive(Debug, Clone)]
pub struct TxIntent {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: GasOptions,
}

/// On-chain outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Reverted,
}

/// Terminal record for one submission, produced exactly once.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub transaction_hash: H256,
    pub status: TxStatus,
    pub gas_used: U256,
    pub effective_gas_price: U256,
    pub nonce: u64,
}

impl SubmissionResult {
    /// Fee actually charged, also on revert.
    pub fn fee_wei(&self) -> U256 {
        self.gas_used * self.effective_gas_price
    }
}

/// Per-network transaction submitter.
pub struct Submitter {
    network: String,
    chain_id: u64,
    node: Arc<dyn NodeApi>,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl Submitter {
    pub fn new(
        network: &str,
        chain_id: u64,
        node: Arc<dyn NodeApi>,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            network: network.to_string(),
            chain_id,
            node,
            confirm_timeout,
            poll_interval,
        }
    }

    /// Execute one transaction intent: Built → Signed → Broadcast →
    /// Confirmed | Reverted | TimedOut.
    pub async fn submit(
        &self,
        signer: &SignerHandle,
        intent: TxIntent,
    ) -> ExecutionResult<SubmissionResult> {
        let started = Instant::now();

        // Built: fresh nonce per request; concurrent requests for the
        // same address may collide, which surfaces at broadcast.
        let nonce = self.node.transaction_count(signer.address()).await?;
        let tx = self.build_transaction(&intent, nonce);

        debug!(
            network = %self.network,
            nonce,
            gas_limit = %intent.gas.gas_limit(),
            signer = signer.variant(),
            auto_send = signer.can_auto_send(),
            "built transaction"
        );

        // Signed: device-state failures (rejection, lock, wrong app)
        // come back already classified and are terminal.
        let raw = signer.sign(&tx).await.inspect_err(|e| {
            crate::metrics::record_tx_failed(&self.network, e.kind());
        })?;

        // Broadcast: terminal on failure, never retried with a new nonce.
        let hash = self.node.send_raw_transaction(raw).await.inspect_err(|e| {
            crate::metrics::record_tx_failed(&self.network, e.kind());
        })?;
        crate::metrics::record_tx_submitted(&self.network);
        info!(network = %self.network, tx_hash = ?hash, nonce, "transaction broadcast");

        // Confirmed/Reverted raced against the timer; on timeout the
        // transaction may still land and the caller re-queries by hash.
        let receipt = match timeout(self.confirm_timeout, self.wait_for_receipt(hash)).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                crate::metrics::record_tx_failed(&self.network, e.kind());
                return Err(e);
            }
            Err(_) => {
                warn!(
                    network = %self.network,
                    tx_hash = ?hash,
                    "confirmation wait exceeded {:?}; transaction may still be pending",
                    self.confirm_timeout
                );
                crate::metrics::record_tx_failed(&self.network, "TimedOut");
                return Err(ExecutionError::TimedOut {
                    tx_hash: Some(format!("{:?}", hash)),
                });
            }
        };

        let status = if receipt.status == Some(1.into()) {
            TxStatus::Success
        } else {
            TxStatus::Reverted
        };

        let result = SubmissionResult {
            transaction_hash: hash,
            status,
            gas_used: receipt.gas_used.unwrap_or_default(),
            effective_gas_price: receipt.effective_gas_price.unwrap_or_default(),
            nonce,
        };

        crate::metrics::record_confirm_latency(&self.network, started.elapsed().as_secs_f64());
        match status {
            TxStatus::Success => crate::metrics::record_tx_confirmed(&self.network),
            TxStatus::Reverted => crate::metrics::record_tx_reverted(&self.network),
        }
        info!(
            network = %self.network,
            tx_hash = ?hash,
            ?status,
            gas_used = %result.gas_used,
            "transaction mined"
        );

        Ok(result)
    }

    fn build_transaction(&self, intent: &TxIntent, nonce: u64) -> TypedTransaction {
        match &intent.gas {
            GasOptions::Legacy {
                gas_price,
                gas_limit,
            } => {
                let tx = TransactionRequest::new()
                    .to(intent.to)
                    .data(intent.data.clone())
                    .value(intent.value)
                    .nonce(nonce)
                    .gas(*gas_limit)
                    .gas_price(*gas_price)
                    .chain_id(self.chain_id);
                TypedTransaction::Legacy(tx)
            }
            GasOptions::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                gas_limit,
            } => {
                let tx = Eip1559TransactionRequest::new()
                    .to(intent.to)
                    .data(intent.data.clone())
                    .value(intent.value)
                    .nonce(nonce)
                    .gas(*gas_limit)
                    .max_fee_per_gas(*max_fee_per_gas)
                    .max_priority_fee_per_gas(*max_priority_fee_per_gas)
                    .chain_id(self.chain_id);
                TypedTransaction::Eip1559(tx)
            }
        }
    }

    async fn wait_for_receipt(&self, hash: H256) -> ExecutionResult<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.node.transaction_receipt(hash).await? {
                if receipt.block_number.is_some() {
                    return Ok(receipt);
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
