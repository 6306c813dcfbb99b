//! Configuration management for the gateway
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub wallet: WalletConfig,
    pub networks: HashMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Hex-encoded private keys for software-backed wallets.
    #[serde(default)]
    pub private_keys: Vec<String>,
    /// Addresses explicitly registered as hardware-wallet-backed.
    #[serde(default)]
    pub hardware_addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub native_symbol: String,

    /// Floor for the legacy gas price; also used outright when the
    /// node reports zero or the price query errors.
    #[serde(default = "default_min_gas_price_gwei")]
    pub min_gas_price_gwei: f64,
    /// Priority fee added on top of the scaled base fee (EIP-1559).
    #[serde(default = "default_priority_fee_gwei")]
    pub priority_fee_gwei: f64,
    /// Base fee headroom against block-to-block variability.
    #[serde(default = "default_base_fee_multiplier")]
    pub base_fee_multiplier: f64,
    /// Fixed gas price override; skips the node fee query entirely.
    pub fixed_gas_price_gwei: Option<f64>,

    #[serde(default = "default_fee_cache_ttl_secs")]
    pub fee_cache_ttl_secs: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// AMM V2 router for liquidity operations.
    pub router_address: Option<String>,

    #[serde(default)]
    pub tokens: HashMap<String, TokenConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub decimals: u8,
}

fn default_min_gas_price_gwei() -> f64 {
    0.1
}

fn default_priority_fee_gwei() -> f64 {
    2.0
}

fn default_base_fee_multiplier() -> f64 {
    2.0
}

fn default_fee_cache_ttl_secs() -> u64 {
    10
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("GATEWAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings = toml::from_str(&config_str)
            .with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.networks.is_empty() {
            anyhow::bail!("At least one network must be configured");
        }

        for (name, network) in &self.networks {
            if network.rpc_url.is_empty() {
                anyhow::bail!("Network {} has no RPC URL configured", name);
            }
            if network.base_fee_multiplier < 1.0 {
                anyhow::bail!(
                    "Network {} has base_fee_multiplier < 1.0; the max fee would undercut the base fee",
                    name
                );
            }
            if network.min_gas_price_gwei <= 0.0 {
                anyhow::bail!("Network {} has a non-positive min_gas_price_gwei", name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
impl NetworkConfig {
    /// Baseline network config for unit tests.
    pub(crate) fn test_config() -> Self {
        Self {
            chain_id: 369,
            rpc_url: "http://localhost:8545".to_string(),
            native_symbol: "PLS".to_string(),
            min_gas_price_gwei: 1.0,
            priority_fee_gwei: 2.0,
            base_fee_multiplier: 2.0,
            fixed_gas_price_gwei: None,
            fee_cache_ttl_secs: 10,
            rpc_timeout_secs: 10,
            confirm_timeout_secs: 60,
            poll_interval_ms: 1000,
            router_address: None,
            tokens: HashMap::new(),
        }
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    fn minimal_toml() -> &'static str {
        r#"
            [server]
            host = "0.0.0.0"
            port = 15888

            [metrics]
            enabled = false
            port = 9464

            [wallet]

            [networks.pulsechain]
            chain_id = 369
            rpc_url = "https://rpc.pulsechain.com"
            native_symbol = "PLS"

            [networks.pulsechain.tokens.WPLS]
            address = "0xA1077a294dDE1B09bB078844df40758a5D0f9a27"
            decimals = 18
        "#
    }

    #[test]
    fn test_parse_minimal_config_with_defaults() {
        let settings: Settings = toml::from_str(minimal_toml()).unwrap();
        settings.validate().unwrap();

        let net = &settings.networks["pulsechain"];
        assert_eq!(net.chain_id, 369);
        assert_eq!(net.priority_fee_gwei, 2.0);
        assert_eq!(net.base_fee_multiplier, 2.0);
        assert_eq!(net.confirm_timeout_secs, 60);
        assert!(net.fixed_gas_price_gwei.is_none());
        assert_eq!(net.tokens["WPLS"].decimals, 18);
    }

    #[test]
    fn test_validate_rejects_empty_networks() {
        let settings = Settings {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 15888,
            },
            metrics: MetricsConfig {
                enabled: false,
                port: 9464,
            },
            wallet: WalletConfig {
                private_keys: vec![],
                hardware_addresses: vec![],
            },
            networks: HashMap::new(),
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file_with_env_substitution() {
        use std::io::Write;

        env::set_var("TEST_GATEWAY_RPC", "https://rpc.example.com");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            minimal_toml().replace("https://rpc.pulsechain.com", "${TEST_GATEWAY_RPC}")
        )
        .unwrap();

        env::set_var("GATEWAY_CONFIG", file.path());
        let settings = Settings::load().unwrap();
        env::remove_var("GATEWAY_CONFIG");

        assert_eq!(
            settings.networks["pulsechain"].rpc_url,
            "https://rpc.example.com"
        );
    }

    #[test]
    fn test_validate_rejects_low_multiplier() {
        let mut settings: Settings = toml::from_str(minimal_toml()).unwrap();
        settings
            .networks
            .get_mut("pulsechain")
            .unwrap()
            .base_fee_multiplier = 0.5;
        assert!(settings.validate().is_err());
    }
}
