//! Per-network token registry
//!
//! Maps symbols to contract addresses and decimals. Used only to size
//! amounts and locate contracts; the execution core never interprets
//! token semantics beyond that.

use crate::config::TokenConfig;
use crate::error::{ExecutionError, ExecutionResult};

use ethers::types::Address;
use std::collections::HashMap;

/// One registered token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// Symbol-keyed token registry for one network.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, TokenInfo>,
}

impl TokenRegistry {
    pub fn from_config(tokens: &HashMap<String, TokenConfig>) -> ExecutionResult<Self> {
        let mut map = HashMap::new();
        for (symbol, cfg) in tokens {
            let address: Address = cfg.address.parse().map_err(|e| {
                ExecutionError::InvalidNetwork(format!(
                    "token {} has an invalid address {}: {}",
                    symbol, cfg.address, e
                ))
            })?;
            map.insert(
                symbol.clone(),
                TokenInfo {
                    symbol: symbol.clone(),
                    address,
                    decimals: cfg.decimals,
                },
            );
        }
        Ok(Self { tokens: map })
    }

    pub fn get(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.get(symbol)
    }

    /// The wrapped form of the native token, by the `W` + native symbol
    /// convention (WETH, WPLS, WBNB).
    pub fn wrapped_native(&self, native_symbol: &str) -> ExecutionResult<&TokenInfo> {
        let wrapped_symbol = format!("W{}", native_symbol);
        self.tokens.get(&wrapped_symbol).ok_or_else(|| {
            ExecutionError::InvalidNetwork(format!(
                "wrapped token {} not found in the token list; ensure {} is configured",
                wrapped_symbol, wrapped_symbol
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TokenRegistry {
        let mut cfg = HashMap::new();
        cfg.insert(
            "WPLS".to_string(),
            TokenConfig {
                address: "0xA1077a294dDE1B09bB078844df40758a5D0f9a27".to_string(),
                decimals: 18,
            },
        );
        cfg.insert(
            "USDC".to_string(),
            TokenConfig {
                address: "0x15D38573d2feeb82e7ad5187aB8c1D52810B1f07".to_string(),
                decimals: 6,
            },
        );
        TokenRegistry::from_config(&cfg).unwrap()
    }

    #[test]
    fn test_wrapped_native_lookup() {
        let reg = registry();
        let wrapped = reg.wrapped_native("PLS").unwrap();
        assert_eq!(wrapped.symbol, "WPLS");
        assert_eq!(wrapped.decimals, 18);
    }

    #[test]
    fn test_wrapped_native_missing() {
        let reg = registry();
        let err = reg.wrapped_native("ETH").unwrap_err();
        assert_eq!(err.kind(), "InvalidNetwork");
        assert!(err.to_string().contains("WETH"));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut cfg = HashMap::new();
        cfg.insert(
            "BAD".to_string(),
            TokenConfig {
                address: "not-an-address".to_string(),
                decimals: 18,
            },
        );
        assert!(TokenRegistry::from_config(&cfg).is_err());
    }
}
