//! Wallet resolution and signing
//!
//! An address is backed either by an in-process key or by an external
//! hardware device. Both variants share one contract: produce encoded
//! signed bytes for a fully-built unsigned transaction. The submitter
//! only ever consults [`SignerHandle::can_auto_send`], never the
//! variant itself.

pub mod device;

use crate::config::WalletConfig;
use crate::error::{ExecutionError, ExecutionResult};
use device::HardwareDevice;

use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Signing capability resolved for one request.
pub enum SignerHandle {
    /// In-process private key; can sign and broadcast back-to-back.
    Software(LocalWallet),
    /// External device bound to an address; signing is a separate
    /// explicit step and broadcast happens afterwards.
    Hardware {
        address: Address,
        device: Arc<dyn HardwareDevice>,
    },
}

impl std::fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerHandle")
            .field("variant", &self.variant())
            .field("address", &self.address())
            .finish()
    }
}

impl SignerHandle {
    pub fn address(&self) -> Address {
        match self {
            SignerHandle::Software(wallet) => wallet.address(),
            SignerHandle::Hardware { address, .. } => *address,
        }
    }

    /// Whether signing and sending collapse into one step.
    pub fn can_auto_send(&self) -> bool {
        matches!(self, SignerHandle::Software(_))
    }

    pub fn variant(&self) -> &'static str {
        match self {
            SignerHandle::Software(_) => "software",
            SignerHandle::Hardware { .. } => "hardware",
        }
    }

    /// Sign a fully-built unsigned transaction into raw signed bytes.
    pub async fn sign(&self, tx: &TypedTransaction) -> ExecutionResult<Bytes> {
        match self {
            SignerHandle::Software(wallet) => {
                let chain_id = tx
                    .chain_id()
                    .map(|c| c.as_u64())
                    .unwrap_or_else(|| wallet.chain_id());
                let wallet = wallet.clone().with_chain_id(chain_id);
                let signature = wallet.sign_transaction(tx).await.map_err(|e| {
                    ExecutionError::InternalFailure(format!("failed to sign transaction: {}", e))
                })?;
                Ok(tx.rlp_signed(&signature))
            }
            SignerHandle::Hardware { address, device } => {
                Ok(device.sign_transaction(*address, tx).await?)
            }
        }
    }
}

/// Resolves an address to its signing capability.
pub struct SignerResolver {
    software: HashMap<Address, LocalWallet>,
    hardware: HashSet<Address>,
    device: Option<Arc<dyn HardwareDevice>>,
}

impl SignerResolver {
    pub fn from_config(
        config: &WalletConfig,
        device: Option<Arc<dyn HardwareDevice>>,
    ) -> Result<Self> {
        let mut software = HashMap::new();
        for key in &config.private_keys {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let wallet: LocalWallet = key
                .parse()
                .context("invalid private key in wallet configuration")?;
            software.insert(wallet.address(), wallet);
        }

        let mut hardware = HashSet::new();
        for address in &config.hardware_addresses {
            let address: Address = address
                .parse()
                .with_context(|| format!("invalid hardware wallet address: {}", address))?;
            hardware.insert(address);
        }

        info!(
            software_wallets = software.len(),
            hardware_wallets = hardware.len(),
            "signer resolver initialized"
        );

        Ok(Self {
            software,
            hardware,
            device,
        })
    }

    /// Resolve the signer for an address.
    ///
    /// The hardware registry is consulted first: the two paths diverge
    /// in how a transaction is subsequently built, so the decision must
    /// precede any balance or allowance validation.
    pub fn resolve(&self, address: Address) -> ExecutionResult<SignerHandle> {
        if self.hardware.contains(&address) {
            let device = self.device.clone().ok_or_else(|| {
                ExecutionError::InternalFailure(format!(
                    "address {:?} is registered as hardware-backed but no device transport is configured",
                    address
                ))
            })?;
            return Ok(SignerHandle::Hardware { address, device });
        }

        self.software
            .get(&address)
            .map(|wallet| SignerHandle::Software(wallet.clone()))
            .ok_or_else(|| ExecutionError::WalletNotFound(format!("{:?}", address)))
    }

    /// First configured software wallet, for requests that omit one.
    pub fn first_software_address(&self) -> Option<Address> {
        self.software.keys().next().copied()
    }
}
