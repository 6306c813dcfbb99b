//! Wrap native currency into its wrapped ERC-20 form (WETH9 `deposit()`).

use crate::chain::erc20;
use crate::chain::Network;
use crate::error::ExecutionResult;
use crate::ops::{format_units_string, parse_address, parse_token_amount, WRAP_GAS_LIMIT};
use crate::tx::gas::build_gas_options;
use crate::tx::submitter::{TxIntent, TxStatus};
use crate::wallet::SignerResolver;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct WrapRequest {
    pub network: String,
    pub address: String,
    /// Decimal amount of native currency to wrap, e.g. "1.5".
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct WrapResponse {
    pub signature: String,
    pub status: TxStatus,
    pub nonce: u64,
    /// Gas fee charged, in native units.
    pub fee: String,
    pub amount: String,
    pub wrapped_address: String,
    pub native_token: String,
    pub wrapped_token: String,
}

/// Wrap `amount` of the native currency held by `address`.
///
/// The attached value carries the amount; the wrapped contract mints
/// 1:1 on `deposit()`. No native-balance pre-check: an underfunded
/// wrap surfaces as a classified broadcast rejection.
pub async fn wrap(
    network: &Network,
    signers: &SignerResolver,
    address: &str,
    amount: &str,
) -> ExecutionResult<WrapResponse> {
    let owner = parse_address(address)?;
    let signer = signers.resolve(owner)?;
    let wrapped = network
        .tokens
        .wrapped_native(&network.config.native_symbol)?
        .clone();
    let value = parse_token_amount(amount, 18)?;

    info!(
        network = %network.name,
        address,
        amount,
        signer = signer.variant(),
        "wrapping {} into {}",
        network.config.native_symbol,
        wrapped.symbol
    );

    let gas = build_gas_options(None, WRAP_GAS_LIMIT, &network.fees).await?;
    let intent = TxIntent {
        to: wrapped.address,
        data: erc20::deposit_calldata(),
        value,
        gas,
    };
    let result = network.submitter().submit(&signer, intent).await?;

    Ok(WrapResponse {
        signature: format!("{:?}", result.transaction_hash),
        status: result.status,
        nonce: result.nonce,
        fee: format_units_string(result.fee_wei(), 18),
        amount: format_units_string(value, 18),
        wrapped_address: format!("{:?}", wrapped.address),
        native_token: network.config.native_symbol.clone(),
        wrapped_token: wrapped.symbol.clone(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chain::provider::{MockNodeApi, NodeFeeData};
    use crate::config::{NetworkConfig, TokenConfig, WalletConfig};
    use crate::wallet::device::{HardwareDevice, MockHardwareDevice};
    use crate::wallet::tests::{TEST_ADDRESS, TEST_KEY};

    use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
    use std::sync::Arc;

    pub(crate) const WPLS_ADDRESS: &str = "0xA1077a294dDE1B09bB078844df40758a5D0f9a27";

    pub(crate) fn test_network_config() -> NetworkConfig {
        let mut config = NetworkConfig::test_config();
        config.tokens.insert(
            "WPLS".to_string(),
            TokenConfig {
                address: WPLS_ADDRESS.to_string(),
                decimals: 18,
            },
        );
        config
    }

    pub(crate) fn success_receipt(hash: H256) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: hash,
            status: Some(1.into()),
            gas_used: Some(U256::from(45_000u64)),
            effective_gas_price: Some(U256::from(2_000_000_000u64)),
            block_number: Some(100.into()),
            ..Default::default()
        }
    }

    fn legacy_fee_data() -> NodeFeeData {
        NodeFeeData {
            base_fee_per_gas: None,
            gas_price: Some(U256::from(2_000_000_000u64)),
        }
    }

    #[tokio::test]
    async fn test_hardware_wrap_builds_tx_with_fetched_nonce_and_full_value() {
        let hash = H256::repeat_byte(0xaa);
        let expected: Address = TEST_ADDRESS.parse().unwrap();

        let mut node = MockNodeApi::new();
        node.expect_fee_data().returning(|| Ok(legacy_fee_data()));
        node.expect_transaction_count()
            .times(1)
            .withf(move |a| *a == expected)
            .returning(|_| Ok(5));
        node.expect_send_raw_transaction()
            .times(1)
            .returning(move |_| Ok(hash));
        node.expect_transaction_receipt()
            .returning(move |h| Ok(Some(success_receipt(h))));

        // The device must see the fully-built unsigned transaction:
        // value = 1.0 native = 10^18 wei, nonce already populated.
        let mut device = MockHardwareDevice::new();
        device
            .expect_sign_transaction()
            .times(1)
            .withf(move |a, tx| {
                *a == expected
                    && tx.value() == Some(&U256::exp10(18))
                    && tx.nonce() == Some(&U256::from(5u64))
            })
            .returning(|_, _| Ok(Bytes::from(vec![0x02; 8])));
        let device: Arc<dyn HardwareDevice> = Arc::new(device);

        let network =
            Network::with_node("pulsechain", &test_network_config(), Arc::new(node)).unwrap();
        // No software keys at all: the hardware path must carry the whole flow.
        let signers = SignerResolver::from_config(
            &WalletConfig {
                private_keys: vec![],
                hardware_addresses: vec![TEST_ADDRESS.to_string()],
            },
            Some(device),
        )
        .unwrap();

        let response = wrap(&network, &signers, TEST_ADDRESS, "1.0").await.unwrap();

        assert_eq!(response.status, TxStatus::Success);
        assert_eq!(response.nonce, 5);
        assert_eq!(response.wrapped_token, "WPLS");
        assert_eq!(response.native_token, "PLS");
        assert_eq!(response.signature, format!("{:?}", hash));
    }

    #[tokio::test]
    async fn test_software_wrap_succeeds_and_reports_fee() {
        let hash = H256::repeat_byte(0xbb);
        let mut node = MockNodeApi::new();
        node.expect_fee_data().returning(|| Ok(legacy_fee_data()));
        node.expect_transaction_count().returning(|_| Ok(0));
        node.expect_send_raw_transaction().returning(move |_| Ok(hash));
        node.expect_transaction_receipt()
            .returning(move |h| Ok(Some(success_receipt(h))));

        let network =
            Network::with_node("pulsechain", &test_network_config(), Arc::new(node)).unwrap();
        let signers = SignerResolver::from_config(
            &WalletConfig {
                private_keys: vec![TEST_KEY.to_string()],
                hardware_addresses: vec![],
            },
            None,
        )
        .unwrap();

        let response = wrap(&network, &signers, TEST_ADDRESS, "0.5").await.unwrap();

        assert_eq!(response.status, TxStatus::Success);
        // 45_000 gas * 2 gwei = 0.00009 native
        assert!(response.fee.starts_with("0.00009"));
        assert!(response.amount.starts_with("0.5"));
    }

    #[tokio::test]
    async fn test_wrap_for_unknown_wallet_never_touches_the_node() {
        // No expectations: any node call panics.
        let network =
            Network::with_node("pulsechain", &test_network_config(), Arc::new(MockNodeApi::new()))
                .unwrap();
        let signers = SignerResolver::from_config(
            &WalletConfig {
                private_keys: vec![],
                hardware_addresses: vec![],
            },
            None,
        )
        .unwrap();

        let err = wrap(&network, &signers, TEST_ADDRESS, "1.0").await.unwrap_err();
        assert_eq!(err.kind(), "WalletNotFound");
    }
}
