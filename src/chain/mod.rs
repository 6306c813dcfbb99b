//! Per-network chain access: node clients, fee estimators, and token
//! registries, grouped under one handle and looked up by network name.

pub mod erc20;
pub mod provider;

use crate::config::{NetworkConfig, Settings};
use crate::error::{ExecutionError, ExecutionResult};
use crate::tokens::TokenRegistry;
use crate::tx::fees::FeeEstimator;
use crate::tx::submitter::Submitter;
use provider::{NodeApi, NodeClient};

use anyhow::{Context, Result};
use dashmap::DashMap;
use ethers::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything the gateway needs to talk to one network.
pub struct Network {
    pub name: String,
    pub config: NetworkConfig,
    pub node: Arc<dyn NodeApi>,
    pub fees: FeeEstimator,
    pub tokens: TokenRegistry,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Network {
    pub fn new(name: &str, config: &NetworkConfig) -> Result<Self> {
        let node: Arc<dyn NodeApi> = Arc::new(
            NodeClient::new(config)
                .with_context(|| format!("failed to connect to network {}", name))?,
        );
        Self::with_node(name, config, node)
    }

    /// Constructor seam for tests: inject any [`NodeApi`].
    pub fn with_node(name: &str, config: &NetworkConfig, node: Arc<dyn NodeApi>) -> Result<Self> {
        let tokens = TokenRegistry::from_config(&config.tokens)
            .with_context(|| format!("invalid token list for network {}", name))?;
        let fees = FeeEstimator::new(name, config, node.clone());

        Ok(Self {
            name: name.to_string(),
            config: config.clone(),
            node,
            fees,
            tokens,
        })
    }

    /// Fresh submitter sharing this network's node handle.
    pub fn submitter(&self) -> Submitter {
        Submitter::new(
            &self.name,
            self.config.chain_id,
            self.node.clone(),
            Duration::from_secs(self.config.confirm_timeout_secs),
            Duration::from_millis(self.config.poll_interval_ms),
        )
    }

    /// Configured AMM router, required by liquidity operations.
    pub fn router_address(&self) -> ExecutionResult<Address> {
        let raw = self.config.router_address.as_deref().ok_or_else(|| {
            ExecutionError::InvalidNetwork(format!(
                "network {} has no router configured",
                self.name
            ))
        })?;
        raw.parse().map_err(|_| {
            ExecutionError::InvalidNetwork(format!(
                "network {} has an invalid router address: {}",
                self.name, raw
            ))
        })
    }
}

/// Named collection of configured networks.
pub struct NetworkManager {
    networks: DashMap<String, Arc<Network>>,
}

impl NetworkManager {
    pub fn new(settings: &Settings) -> Result<Self> {
        let networks = DashMap::new();
        for (name, config) in &settings.networks {
            let network = Network::new(name, config)?;
            info!(network = %name, chain_id = config.chain_id, "network initialized");
            networks.insert(name.clone(), Arc::new(network));
        }
        Ok(Self { networks })
    }

    #[cfg(test)]
    pub(crate) fn from_networks(networks: Vec<Network>) -> Self {
        let map = DashMap::new();
        for network in networks {
            map.insert(network.name.clone(), Arc::new(network));
        }
        Self { networks: map }
    }

    /// Look up a network by name; unknown names are a caller error.
    pub fn get(&self, name: &str) -> ExecutionResult<Arc<Network>> {
        self.networks
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ExecutionError::InvalidNetwork(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.networks.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::provider::MockNodeApi;
    use crate::config::NetworkConfig;

    fn test_network(name: &str) -> Network {
        Network::with_node(name, &NetworkConfig::test_config(), Arc::new(MockNodeApi::new()))
            .unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let manager = NetworkManager::from_networks(vec![test_network("pulsechain")]);
        let network = manager.get("pulsechain").unwrap();
        assert_eq!(network.config.chain_id, 369);
    }

    #[test]
    fn test_unknown_network_is_invalid_network() {
        let manager = NetworkManager::from_networks(vec![test_network("pulsechain")]);
        let err = manager.get("basechain").unwrap_err();
        assert_eq!(err.kind(), "InvalidNetwork");
    }

    #[test]
    fn test_missing_router_is_invalid_network() {
        let network = test_network("pulsechain");
        let err = network.router_address().unwrap_err();
        assert_eq!(err.kind(), "InvalidNetwork");
    }
}
