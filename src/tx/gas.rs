//! Gas option construction for outbound transactions
//!
//! Turns an optional caller-supplied price plus the fee estimator's
//! output into the concrete fee fields attached to one transaction.
//! Options are derived per call and never cached.

use crate::error::{ExecutionError, ExecutionResult};
use crate::tx::fees::{FeeEstimate, FeeEstimator, FeeMode};

use ethers::types::U256;

/// Concrete fee/limit fields for one outbound transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasOptions {
    Legacy {
        gas_price: U256,
        gas_limit: U256,
    },
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
        gas_limit: U256,
    },
}

impl GasOptions {
    pub fn gas_limit(&self) -> U256 {
        match self {
            GasOptions::Legacy { gas_limit, .. } => *gas_limit,
            GasOptions::Eip1559 { gas_limit, .. } => *gas_limit,
        }
    }

    /// Caller override: honored verbatim as a legacy gas price,
    /// bypassing EIP-1559 construction entirely.
    pub fn from_override(price_gwei: f64, gas_limit: u64) -> ExecutionResult<Self> {
        if !price_gwei.is_finite() || price_gwei <= 0.0 {
            return Err(ExecutionError::InvalidGasParameters(format!(
                "gas price override must be a positive finite number, got {}",
                price_gwei
            )));
        }
        Ok(GasOptions::Legacy {
            gas_price: gwei_to_wei(price_gwei),
            gas_limit: U256::from(gas_limit),
        })
    }

    /// Translate a fee estimate; the shape follows the estimate's mode.
    pub fn from_estimate(estimate: &FeeEstimate, gas_limit: u64) -> Self {
        match estimate.fee_mode {
            FeeMode::Eip1559 => GasOptions::Eip1559 {
                max_fee_per_gas: gwei_to_wei(
                    estimate.max_fee_per_gas_gwei.unwrap_or(estimate.gas_price_gwei),
                ),
                max_priority_fee_per_gas: gwei_to_wei(
                    estimate.max_priority_fee_per_gas_gwei.unwrap_or_default(),
                ),
                gas_limit: U256::from(gas_limit),
            },
            FeeMode::Legacy => GasOptions::Legacy {
                gas_price: gwei_to_wei(estimate.gas_price_gwei),
                gas_limit: U256::from(gas_limit),
            },
        }
    }
}

/// Build gas options for one transaction. Explicit caller intent wins
/// over automatic fee calculation; the estimator is only consulted
/// when no override is supplied.
pub async fn build_gas_options(
    override_price_gwei: Option<f64>,
    gas_limit: u64,
    fees: &FeeEstimator,
) -> ExecutionResult<GasOptions> {
    match override_price_gwei {
        Some(price) => GasOptions::from_override(price, gas_limit),
        None => {
            let estimate = fees.estimate().await?;
            Ok(GasOptions::from_estimate(&estimate, gas_limit))
        }
    }
}

pub fn gwei_to_wei(gwei: f64) -> U256 {
    U256::from((gwei * 1e9).round() as u128)
}

pub fn wei_to_gwei(wei: U256) -> f64 {
    wei.low_u128() as f64 / 1e9
}
