//! Unwrap the wrapped ERC-20 back to native currency (`withdraw(uint256)`).

use crate::chain::erc20;
use crate::chain::Network;
use crate::error::{ExecutionError, ExecutionResult};
use crate::ops::{format_units_string, parse_address, parse_token_amount, UNWRAP_GAS_LIMIT};
use crate::tx::gas::build_gas_options;
use crate::tx::submitter::{TxIntent, TxStatus};
use crate::wallet::SignerResolver;

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct UnwrapRequest {
    pub network: String,
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct UnwrapResponse {
    pub signature: String,
    pub status: TxStatus,
    pub nonce: u64,
    pub fee: String,
    pub amount: String,
    pub wrapped_address: String,
    pub native_token: String,
    pub wrapped_token: String,
}

/// Unwrap `amount` of the wrapped token back to native currency.
///
/// The wrapped balance is checked before anything is signed or
/// broadcast: withdrawing more than held would revert on-chain and
/// still burn gas.
pub async fn unwrap(
    network: &Network,
    signers: &SignerResolver,
    address: &str,
    amount: &str,
) -> ExecutionResult<UnwrapResponse> {
    let owner = parse_address(address)?;
    let signer = signers.resolve(owner)?;
    let wrapped = network
        .tokens
        .wrapped_native(&network.config.native_symbol)?
        .clone();
    let requested = parse_token_amount(amount, wrapped.decimals)?;

    let balance = erc20::balance_of(network.node.as_ref(), wrapped.address, owner).await?;
    if balance < requested {
        return Err(ExecutionError::InsufficientBalance(format!(
            "insufficient {} balance. Available: {}, Required: {}",
            wrapped.symbol,
            format_units_string(balance, wrapped.decimals),
            amount
        )));
    }

    info!(
        network = %network.name,
        address,
        amount,
        signer = signer.variant(),
        "unwrapping {} into {}",
        wrapped.symbol,
        network.config.native_symbol
    );

    let gas = build_gas_options(None, UNWRAP_GAS_LIMIT, &network.fees).await?;
    let intent = TxIntent {
        to: wrapped.address,
        data: erc20::withdraw_calldata(requested),
        value: U256::zero(),
        gas,
    };
    let result = network.submitter().submit(&signer, intent).await?;

    Ok(UnwrapResponse {
        signature: format!("{:?}", result.transaction_hash),
        status: result.status,
        nonce: result.nonce,
        fee: format_units_string(result.fee_wei(), 18),
        amount: format_units_string(requested, wrapped.decimals),
        wrapped_address: format!("{:?}", wrapped.address),
        native_token: network.config.native_symbol.clone(),
        wrapped_token: wrapped.symbol.clone(),
    })
}
