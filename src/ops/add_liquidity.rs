//! Add liquidity to an AMM V2 pool through the configured router.
//!
//! Native sides are wrapped first, both allowances are verified against
//! the exact raw amounts before anything is signed, and the router call
//! uses slippage-adjusted minimums with a 20-minute deadline. Pool math
//! (reserves, quoting, price impact) is out of scope: the caller's
//! amounts are used directly.

use crate::chain::erc20;
use crate::chain::provider::NodeApi;
use crate::chain::Network;
use crate::error::{ExecutionError, ExecutionResult};
use crate::ops::{
    deadline_from_now, format_units_string, parse_address, parse_token_amount,
    slippage_min_amount, wrap, ADD_LIQUIDITY_GAS_LIMIT, DEADLINE_WINDOW_SECS,
    DEFAULT_SLIPPAGE_PCT,
};
use crate::tokens::TokenInfo;
use crate::tx::gas::build_gas_options;
use crate::tx::submitter::{TxIntent, TxStatus};
use crate::wallet::SignerResolver;

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AddLiquidityRequest {
    pub network: String,
    /// Defaults to the first configured software wallet when omitted.
    pub wallet_address: Option<String>,
    pub base_token: String,
    pub quote_token: String,
    pub base_token_amount: String,
    pub quote_token_amount: String,
    pub slippage_pct: Option<f64>,
    /// Legacy gas price override in gwei; honored verbatim.
    pub gas_price_gwei: Option<f64>,
    pub max_gas: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AddLiquidityResponse {
    pub signature: String,
    pub status: TxStatus,
    pub nonce: u64,
    pub fee: String,
    pub base_token_amount_added: String,
    pub quote_token_amount_added: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_wrap_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_wrap_tx: Option<String>,
}

pub async fn add_liquidity(
    network: &Network,
    signers: &SignerResolver,
    req: AddLiquidityRequest,
) -> ExecutionResult<AddLiquidityResponse> {
    let owner_raw = match req.wallet_address {
        Some(ref address) => address.clone(),
        None => signers
            .first_software_address()
            .map(|a| format!("{:?}", a))
            .ok_or_else(|| {
                ExecutionError::WalletNotFound(
                    "no wallet address provided and none configured".to_string(),
                )
            })?,
    };
    let owner = parse_address(&owner_raw)?;
    let signer = signers.resolve(owner)?;
    let router = network.router_address()?;
    let native = network.config.native_symbol.clone();
    let slippage = req.slippage_pct.unwrap_or(DEFAULT_SLIPPAGE_PCT);

    // A native side is wrapped first; the router only deals in ERC-20s.
    let (base_symbol, base_wrap_tx) =
        wrap_if_native(network, signers, &owner_raw, &req.base_token, &req.base_token_amount)
            .await?;
    let (quote_symbol, quote_wrap_tx) = wrap_if_native(
        network,
        signers,
        &owner_raw,
        &req.quote_token,
        &req.quote_token_amount,
    )
    .await?;

    let base = lookup_token(network, &base_symbol)?;
    let quote = lookup_token(network, &quote_symbol)?;
    let base_amount = parse_token_amount(&req.base_token_amount, base.decimals)?;
    let quote_amount = parse_token_amount(&req.quote_token_amount, quote.decimals)?;

    // Both allowances verified before the router transaction is built;
    // an under-approved pair never reaches the signer.
    ensure_allowance(network.node.as_ref(), &base, owner, router, base_amount).await?;
    ensure_allowance(network.node.as_ref(), &quote, owner, router, quote_amount).await?;

    let base_min = slippage_min_amount(base_amount, slippage)?;
    let quote_min = slippage_min_amount(quote_amount, slippage)?;
    let deadline = deadline_from_now(DEADLINE_WINDOW_SECS);

    info!(
        network = %network.name,
        wallet = %owner_raw,
        base = %base.symbol,
        quote = %quote.symbol,
        slippage_pct = slippage,
        "adding liquidity via {} (native: {})",
        router,
        native
    );

    let gas = build_gas_options(
        req.gas_price_gwei,
        req.max_gas.unwrap_or(ADD_LIQUIDITY_GAS_LIMIT),
        &network.fees,
    )
    .await?;
    let intent = TxIntent {
        to: router,
        data: erc20::add_liquidity_calldata(
            base.address,
            quote.address,
            base_amount,
            quote_amount,
            base_min,
            quote_min,
            owner,
            deadline,
        ),
        value: U256::zero(),
        gas,
    };
    let result = network.submitter().submit(&signer, intent).await?;

    Ok(AddLiquidityResponse {
        signature: format!("{:?}", result.transaction_hash),
        status: result.status,
        nonce: result.nonce,
        fee: format_units_string(result.fee_wei(), 18),
        base_token_amount_added: format_units_string(base_amount, base.decimals),
        quote_token_amount_added: format_units_string(quote_amount, quote.decimals),
        base_wrap_tx,
        quote_wrap_tx,
    })
}

/// Wrap a native-currency side, returning the effective symbol and the
/// wrap transaction hash when one was submitted.
async fn wrap_if_native(
    network: &Network,
    signers: &SignerResolver,
    owner: &str,
    symbol: &str,
    amount: &str,
) -> ExecutionResult<(String, Option<String>)> {
    if symbol != network.config.native_symbol {
        return Ok((symbol.to_string(), None));
    }
    let wrapped_symbol = format!("W{}", network.config.native_symbol);
    info!(
        network = %network.name,
        amount,
        "{} supplied as a pool side, wrapping into {} first",
        symbol,
        wrapped_symbol
    );
    let response = wrap::wrap(network, signers, owner, amount).await?;
    Ok((wrapped_symbol, Some(response.signature)))
}

fn lookup_token(network: &Network, symbol: &str) -> ExecutionResult<TokenInfo> {
    network.tokens.get(symbol).cloned().ok_or_else(|| {
        ExecutionError::InvalidNetwork(format!(
            "token {} not configured on network {}",
            symbol, network.name
        ))
    })
}

async fn ensure_allowance(
    node: &dyn NodeApi,
    token: &TokenInfo,
    owner: Address,
    spender: Address,
    required: U256,
) -> ExecutionResult<()> {
    let current = erc20::allowance(node, token.address, owner, spender).await?;
    if current < required {
        return Err(ExecutionError::InsufficientAllowance(format!(
            "insufficient allowance for {}. Approve at least {} {} for the router {:?} (current: {})",
            token.symbol,
            format_units_string(required, token.decimals),
            token.symbol,
            spender,
            format_units_string(current, token.decimals)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::provider::{MockNodeApi, NodeFeeData};
    use crate::config::{NetworkConfig, TokenConfig, WalletConfig};
    use crate::ops::wrap::tests::{success_receipt, test_network_config};
    use crate::wallet::tests::{TEST_ADDRESS, TEST_KEY};

    use ethers::types::{Bytes, H256};
    use std::sync::Arc;

    const ROUTER: &str = "0x98bf93ebf5c380C0e6Ae8e192A7e2AE08edAcc02";
    const USDC: &str = "0x15D38573d2feeb82e7ad5187aB8c1D52810B1f07";

    fn pool_network_config() -> NetworkConfig {
        let mut config = test_network_config();
        config.router_address = Some(ROUTER.to_string());
        config.tokens.insert(
            "USDC".to_string(),
            TokenConfig {
                address: USDC.to_string(),
                decimals: 6,
            },
        );
        config
    }

    fn software_signers() -> SignerResolver {
        SignerResolver::from_config(
            &WalletConfig {
                private_keys: vec![TEST_KEY.to_string()],
                hardware_addresses: vec![],
            },
            None,
        )
        .unwrap()
    }

    fn word(value: U256) -> Bytes {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        Bytes::from(buf.to_vec())
    }

    fn request(base: &str, quote: &str) -> AddLiquidityRequest {
        AddLiquidityRequest {
            network: "pulsechain".to_string(),
            wallet_address: Some(TEST_ADDRESS.to_string()),
            base_token: base.to_string(),
            quote_token: quote.to_string(),
            base_token_amount: "10.0".to_string(),
            quote_token_amount: "25.0".to_string(),
            slippage_pct: Some(1.0),
            gas_price_gwei: None,
            max_gas: None,
        }
    }

    #[tokio::test]
    async fn test_zero_allowance_blocks_submission_entirely() {
        let mut node = MockNodeApi::new();
        // Zero allowance on the first check. Nothing else is mocked:
        // fetching a nonce, estimating fees, or broadcasting would panic.
        node.expect_call().returning(|_| Ok(word(U256::zero())));

        let network =
            Network::with_node("pulsechain", &pool_network_config(), Arc::new(node)).unwrap();

        let err = add_liquidity(&network, &software_signers(), request("WPLS", "USDC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InsufficientAllowance");
    }

    #[tokio::test]
    async fn test_add_liquidity_with_sufficient_allowances() {
        let hash = H256::repeat_byte(0xdd);
        let mut node = MockNodeApi::new();
        node.expect_call().returning(|_| Ok(word(U256::MAX)));
        node.expect_fee_data().returning(|| {
            Ok(NodeFeeData {
                base_fee_per_gas: Some(U256::from(10_000_000_000u64)),
                gas_price: None,
            })
        });
        node.expect_transaction_count().returning(|_| Ok(11));
        node.expect_send_raw_transaction().returning(move |_| Ok(hash));
        node.expect_transaction_receipt()
            .returning(move |h| Ok(Some(success_receipt(h))));

        let network =
            Network::with_node("pulsechain", &pool_network_config(), Arc::new(node)).unwrap();

        let response = add_liquidity(&network, &software_signers(), request("WPLS", "USDC"))
            .await
            .unwrap();
        assert_eq!(response.status, TxStatus::Success);
        assert_eq!(response.nonce, 11);
        assert!(response.base_token_amount_added.starts_with("10"));
        assert!(response.quote_token_amount_added.starts_with("25"));
        assert!(response.base_wrap_tx.is_none());
        assert!(response.quote_wrap_tx.is_none());
    }

    #[tokio::test]
    async fn test_native_base_side_is_wrapped_first() {
        let mut node = MockNodeApi::new();
        node.expect_call().returning(|_| Ok(word(U256::MAX)));
        node.expect_fee_data().returning(|| {
            Ok(NodeFeeData {
                base_fee_per_gas: None,
                gas_price: Some(U256::from(2_000_000_000u64)),
            })
        });
        node.expect_transaction_count().returning(|_| Ok(0));
        // Two broadcasts: the wrap deposit, then the router call.
        node.expect_send_raw_transaction()
            .times(2)
            .returning(|raw| Ok(H256::from_slice(&ethers::utils::keccak256(&raw))));
        node.expect_transaction_receipt()
            .returning(move |h| Ok(Some(success_receipt(h))));

        let network =
            Network::with_node("pulsechain", &pool_network_config(), Arc::new(node)).unwrap();

        let response = add_liquidity(&network, &software_signers(), request("PLS", "USDC"))
            .await
            .unwrap();
        assert_eq!(response.status, TxStatus::Success);
        assert!(response.base_wrap_tx.is_some());
        assert!(response.quote_wrap_tx.is_none());
    }

    #[tokio::test]
    async fn test_missing_router_rejected_before_any_work() {
        let config = test_network_config(); // no router configured
        let network =
            Network::with_node("pulsechain", &config, Arc::new(MockNodeApi::new())).unwrap();

        let err = add_liquidity(&network, &software_signers(), request("WPLS", "USDC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidNetwork");
    }

    #[tokio::test]
    async fn test_gas_price_override_shapes_legacy_router_tx() {
        // With an override the estimator must stay untouched, so the
        // mock has no fee_data expectation.
        let hash = H256::repeat_byte(0xee);
        let mut node = MockNodeApi::new();
        node.expect_call().returning(|_| Ok(word(U256::MAX)));
        node.expect_transaction_count().returning(|_| Ok(2));
        node.expect_send_raw_transaction().returning(move |_| Ok(hash));
        node.expect_transaction_receipt()
            .returning(move |h| Ok(Some(success_receipt(h))));

        let network =
            Network::with_node("pulsechain", &pool_network_config(), Arc::new(node)).unwrap();

        let mut req = request("WPLS", "USDC");
        req.gas_price_gwei = Some(5.0);
        let response = add_liquidity(&network, &software_signers(), req).await.unwrap();
        assert_eq!(response.status, TxStatus::Success);
    }
}
