//! ERC-20 and WETH9 call encoding plus read-only state queries
//!
//! Calldata is built from ABI signatures directly; the gateway only
//! touches a handful of functions and gains nothing from generated
//! bindings.

use crate::chain::provider::NodeApi;
use crate::error::{ExecutionError, ExecutionResult};

use ethers::abi::{encode, Token};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::id;

/// WETH9 `deposit()`, wrapping the attached native value.
pub fn deposit_calldata() -> Bytes {
    Bytes::from(id("deposit()").to_vec())
}

/// WETH9 `withdraw(uint256)`, unwrapping back to native.
pub fn withdraw_calldata(amount: U256) -> Bytes {
    let mut data = id("withdraw(uint256)").to_vec();
    data.extend(encode(&[Token::Uint(amount)]));
    Bytes::from(data)
}

/// `balanceOf(address)`
pub fn balance_of_calldata(owner: Address) -> Bytes {
    let mut data = id("balanceOf(address)").to_vec();
    data.extend(encode(&[Token::Address(owner)]));
    Bytes::from(data)
}

/// `allowance(address,address)`
pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    let mut data = id("allowance(address,address)").to_vec();
    data.extend(encode(&[Token::Address(owner), Token::Address(spender)]));
    Bytes::from(data)
}

/// V2 router `addLiquidity(...)`
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity_calldata(
    token_a: Address,
    token_b: Address,
    amount_a: U256,
    amount_b: U256,
    amount_a_min: U256,
    amount_b_min: U256,
    to: Address,
    deadline: U256,
) -> Bytes {
    let mut data = id(
        "addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)",
    )
    .to_vec();
    data.extend(encode(&[
        Token::Address(token_a),
        Token::Address(token_b),
        Token::Uint(amount_a),
        Token::Uint(amount_b),
        Token::Uint(amount_a_min),
        Token::Uint(amount_b_min),
        Token::Address(to),
        Token::Uint(deadline),
    ]));
    Bytes::from(data)
}

/// Token balance of `owner` via a read-only call.
pub async fn balance_of(
    node: &dyn NodeApi,
    token: Address,
    owner: Address,
) -> ExecutionResult<U256> {
    let result = node.call(&read_call(token, balance_of_calldata(owner))).await?;
    decode_uint(&result)
}

/// Remaining allowance granted by `owner` to `spender`.
pub async fn allowance(
    node: &dyn NodeApi,
    token: Address,
    owner: Address,
    spender: Address,
) -> ExecutionResult<U256> {
    let result = node
        .call(&read_call(token, allowance_calldata(owner, spender)))
        .await?;
    decode_uint(&result)
}

fn read_call(to: Address, data: Bytes) -> TypedTransaction {
    TransactionRequest::new().to(to).data(data).into()
}

fn decode_uint(bytes: &Bytes) -> ExecutionResult<U256> {
    if bytes.len() < 32 {
        return Err(ExecutionError::InternalFailure(format!(
            "unexpected contract call result length: {}",
            bytes.len()
        )));
    }
    Ok(U256::from_big_endian(&bytes[..32]))
}
