//! Fee estimation with a short-lived per-network cache
//!
//! One estimator exists per network. The cache slot sits behind an
//! async mutex held across the refresh, so a burst of concurrent
//! callers issues at most one live node query: the first caller to
//! observe staleness refreshes, the rest wait on the same lock and
//! read the freshly written value. Expired entries are replaced whole,
//! never merged.

use crate::chain::provider::{NodeApi, NodeFeeData};
use crate::config::NetworkConfig;
use crate::error::ExecutionResult;
use crate::tx::gas::wei_to_gwei;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Which fee model an estimate (and any transaction built from it) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeMode {
    Legacy,
    Eip1559,
}

/// A point-in-time fee estimate for one network.
///
/// `fee_mode` is part of the value itself so downstream shaping never
/// consults ambient state to decide between legacy and EIP-1559.
#[derive(Debug, Clone, Serialize)]
pub struct FeeEstimate {
    pub fee_mode: FeeMode,
    /// Offered price in gwei; in EIP-1559 mode this equals the max fee.
    pub gas_price_gwei: f64,
    pub max_fee_per_gas_gwei: Option<f64>,
    pub max_priority_fee_per_gas_gwei: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

struct CachedEstimate {
    estimate: FeeEstimate,
    fetched_at: Instant,
}

/// Per-network fee estimator.
pub struct FeeEstimator {
    network: String,
    min_gas_price_gwei: f64,
    priority_fee_gwei: f64,
    base_fee_multiplier: f64,
    fixed_gas_price_gwei: Option<f64>,
    ttl: Duration,
    node: Arc<dyn NodeApi>,
    cache: Mutex<Option<CachedEstimate>>,
}

impl FeeEstimator {
    pub fn new(network: &str, config: &NetworkConfig, node: Arc<dyn NodeApi>) -> Self {
        Self {
            network: network.to_string(),
            min_gas_price_gwei: config.min_gas_price_gwei,
            priority_fee_gwei: config.priority_fee_gwei,
            base_fee_multiplier: config.base_fee_multiplier,
            fixed_gas_price_gwei: config.fixed_gas_price_gwei,
            ttl: Duration::from_secs(config.fee_cache_ttl_secs),
            node,
            cache: Mutex::new(None),
        }
    }

    /// Current fee estimate, served from cache within the TTL.
    ///
    /// Fails with `NodeUnavailable` when the underlying fee query
    /// errors or times out.
    pub async fn estimate(&self) -> ExecutionResult<FeeEstimate> {
        // A configured fixed price never goes stale and needs no node.
        if let Some(fixed) = self.fixed_gas_price_gwei {
            return Ok(legacy_estimate(fixed));
        }

        let mut slot = self.cache.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                crate::metrics::record_fee_cache_hit(&self.network);
                return Ok(cached.estimate.clone());
            }
        }

        crate::metrics::record_fee_cache_miss(&self.network);
        let fee_data = self.node.fee_data().await?;
        let estimate = self.estimate_from_fee_data(&fee_data);

        debug!(
            network = %self.network,
            mode = ?estimate.fee_mode,
            gas_price_gwei = estimate.gas_price_gwei,
            "refreshed fee estimate"
        );
        crate::metrics::record_fee_estimate(&self.network, estimate.gas_price_gwei);

        *slot = Some(CachedEstimate {
            estimate: estimate.clone(),
            fetched_at: Instant::now(),
        });

        Ok(estimate)
    }

    fn estimate_from_fee_data(&self, fee_data: &NodeFeeData) -> FeeEstimate {
        match fee_data.base_fee_per_gas {
            // Base fee present: the network speaks EIP-1559.
            Some(base_fee) => {
                let base_gwei = wei_to_gwei(base_fee);
                let max_fee_gwei =
                    base_gwei * self.base_fee_multiplier + self.priority_fee_gwei;
                FeeEstimate {
                    fee_mode: FeeMode::Eip1559,
                    gas_price_gwei: max_fee_gwei,
                    max_fee_per_gas_gwei: Some(max_fee_gwei),
                    max_priority_fee_per_gas_gwei: Some(self.priority_fee_gwei),
                    observed_at: Utc::now(),
                }
            }
            None => {
                let gas_price_gwei = match fee_data.gas_price {
                    // Node price floored at the configured minimum.
                    Some(price) if !price.is_zero() => {
                        wei_to_gwei(price).max(self.min_gas_price_gwei)
                    }
                    _ => self.min_gas_price_gwei,
                };
                legacy_estimate(gas_price_gwei)
            }
        }
    }
}

fn legacy_estimate(gas_price_gwei: f64) -> FeeEstimate {
    FeeEstimate {
        fee_mode: FeeMode::Legacy,
        gas_price_gwei,
        max_fee_per_gas_gwei: None,
        max_priority_fee_per_gas_gwei: None,
        observed_at: Utc::now(),
    }
}
