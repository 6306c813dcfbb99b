//! Gateway operations
//!
//! Each operation validates its inputs, runs its pre-submission guards,
//! then hands a fully-shaped intent to the submitter. Guards always run
//! before any broadcast so a failed check never costs gas.

pub mod add_liquidity;
pub mod unwrap;
pub mod wrap;

pub use add_liquidity::{add_liquidity, AddLiquidityRequest, AddLiquidityResponse};
pub use unwrap::{unwrap, UnwrapRequest, UnwrapResponse};
pub use wrap::{wrap, WrapRequest, WrapResponse};

use crate::error::{ExecutionError, ExecutionResult};

use chrono::Utc;
use ethers::types::{Address, U256};
use ethers::utils::{parse_units, ParseUnits};

pub(crate) const WRAP_GAS_LIMIT: u64 = 50_000;
pub(crate) const UNWRAP_GAS_LIMIT: u64 = 50_000;
pub(crate) const ADD_LIQUIDITY_GAS_LIMIT: u64 = 500_000;
pub(crate) const DEADLINE_WINDOW_SECS: u64 = 20 * 60;
pub(crate) const DEFAULT_SLIPPAGE_PCT: f64 = 1.0;

pub(crate) fn parse_address(raw: &str) -> ExecutionResult<Address> {
    raw.parse()
        .map_err(|_| ExecutionError::InternalFailure(format!("invalid address: {}", raw)))
}

/// Parse a decimal amount string into raw token units.
pub(crate) fn parse_token_amount(amount: &str, decimals: u8) -> ExecutionResult<U256> {
    match parse_units(amount, decimals as u32) {
        Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
        Ok(_) => Err(ExecutionError::InternalFailure(format!(
            "amount must be positive: {}",
            amount
        ))),
        Err(e) => Err(ExecutionError::InternalFailure(format!(
            "invalid amount {}: {}",
            amount, e
        ))),
    }
}

/// Render raw token units as a decimal string.
pub(crate) fn format_units_string(value: U256, decimals: u8) -> String {
    ethers::utils::format_units(value, decimals as u32).unwrap_or_else(|_| value.to_string())
}

/// Slippage-adjusted minimum via basis-points integer math:
/// `amount * (10_000 - bps) / 10_000`.
pub(crate) fn slippage_min_amount(amount: U256, slippage_pct: f64) -> ExecutionResult<U256> {
    if !slippage_pct.is_finite() || !(0.0..=100.0).contains(&slippage_pct) {
        return Err(ExecutionError::InternalFailure(format!(
            "slippage percentage out of range: {}",
            slippage_pct
        )));
    }
    let bps = (slippage_pct * 100.0).round() as u64;
    Ok(amount * U256::from(10_000 - bps) / U256::from(10_000u64))
}

pub(crate) fn deadline_from_now(window_secs: u64) -> U256 {
    U256::from(Utc::now().timestamp().max(0) as u64 + window_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_amount_scales_by_decimals() {
        assert_eq!(parse_token_amount("1.0", 18).unwrap(), U256::exp10(18));
        assert_eq!(parse_token_amount("2.5", 6).unwrap(), U256::from(2_500_000u64));
    }

    #[test]
    fn test_parse_token_amount_rejects_garbage_and_zero() {
        assert!(parse_token_amount("abc", 18).is_err());
        assert!(parse_token_amount("0", 18).is_err());
        assert!(parse_token_amount("-1", 18).is_err());
    }

    #[test]
    fn test_slippage_minimums() {
        // 1% of 10_000 units
        assert_eq!(
            slippage_min_amount(U256::from(10_000u64), 1.0).unwrap(),
            U256::from(9_900u64)
        );
        // 0.5% rounds to 50 bps
        assert_eq!(
            slippage_min_amount(U256::from(10_000u64), 0.5).unwrap(),
            U256::from(9_950u64)
        );
        assert_eq!(
            slippage_min_amount(U256::from(10_000u64), 0.0).unwrap(),
            U256::from(10_000u64)
        );
    }

    #[test]
    fn test_slippage_out_of_range_rejected() {
        assert!(slippage_min_amount(U256::from(1u64), -1.0).is_err());
        assert!(slippage_min_amount(U256::from(1u64), 101.0).is_err());
        assert!(slippage_min_amount(U256::from(1u64), f64::NAN).is_err());
    }

    #[test]
    fn test_deadline_is_in_the_future() {
        let now = U256::from(Utc::now().timestamp() as u64);
        let deadline = deadline_from_now(DEADLINE_WINDOW_SECS);
        assert!(deadline > now);
        assert!(deadline <= now + U256::from(DEADLINE_WINDOW_SECS + 5));
    }

    #[test]
    fn test_format_units_roundtrip() {
        let raw = parse_token_amount("0.000042", 18).unwrap();
        let formatted = format_units_string(raw, 18);
        assert!(formatted.starts_with("0.000042"));
    }
}
