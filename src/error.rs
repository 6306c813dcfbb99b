//! Error taxonomy for the execution gateway
//!
//! Every failure that reaches the API boundary is one of the kinds
//! below. Raw node/device errors are funneled through [`classify`],
//! which is the single place that knows upstream message markers.

use thiserror::Error;

/// Stable error taxonomy consumed by the API boundary.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    #[error("invalid or unknown network: {0}")]
    InvalidNetwork(String),

    #[error("no wallet found for address {0}")]
    WalletNotFound(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("insufficient allowance: {0}")]
    InsufficientAllowance(String),

    #[error("invalid gas parameters: {0}")]
    InvalidGasParameters(String),

    #[error("transaction rejected by user on the device")]
    RejectedByUser,

    #[error("hardware device is locked")]
    DeviceLocked,

    #[error("wrong application open on the device")]
    WrongApplicationOpen,

    #[error("timed out waiting for confirmation (tx may still be pending){}", tx_hash.as_ref().map(|h| format!(": {}", h)).unwrap_or_default())]
    TimedOut { tx_hash: Option<String> },

    #[error("transaction reverted on-chain: {0}")]
    Reverted(String),

    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl ExecutionError {
    /// Stable label for API payloads and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::NodeUnavailable(_) => "NodeUnavailable",
            ExecutionError::InvalidNetwork(_) => "InvalidNetwork",
            ExecutionError::WalletNotFound(_) => "WalletNotFound",
            ExecutionError::InsufficientBalance(_) => "InsufficientBalance",
            ExecutionError::InsufficientAllowance(_) => "InsufficientAllowance",
            ExecutionError::InvalidGasParameters(_) => "InvalidGasParameters",
            ExecutionError::RejectedByUser => "RejectedByUser",
            ExecutionError::DeviceLocked => "DeviceLocked",
            ExecutionError::WrongApplicationOpen => "WrongApplicationOpen",
            ExecutionError::TimedOut { .. } => "TimedOut",
            ExecutionError::Reverted(_) => "Reverted",
            ExecutionError::InternalFailure(_) => "InternalFailure",
        }
    }

    /// Whether the failure signals indeterminate state: the transaction
    /// may still land on-chain and the caller must re-query by hash.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ExecutionError::TimedOut { .. })
    }
}

/// Classify a raw third-party error message into the taxonomy.
///
/// Ordered first-match rules over lowercased message text. This is
/// best-effort string matching over an opaque error surface; anything
/// unmatched falls through to `InternalFailure` with the original
/// message preserved.
pub fn classify(raw: &str) -> ExecutionError {
    let msg = raw.to_lowercase();

    if msg.contains("insufficient funds") || msg.contains("insufficient_funds") {
        return ExecutionError::InsufficientBalance(raw.to_string());
    }
    if msg.contains("insufficient allowance") {
        return ExecutionError::InsufficientAllowance(raw.to_string());
    }
    if msg.contains("rejected on ledger")
        || msg.contains("rejected by user")
        || msg.contains("denied by the user")
    {
        return ExecutionError::RejectedByUser;
    }
    if msg.contains("device is locked") || msg.contains("locked device") {
        return ExecutionError::DeviceLocked;
    }
    if msg.contains("wrong app") || msg.contains("wrong application") {
        return ExecutionError::WrongApplicationOpen;
    }
    if msg.contains("timeout") || msg.contains("timed out") {
        return ExecutionError::TimedOut { tx_hash: None };
    }
    if msg.contains("execution reverted") || msg.contains("transaction reverted") {
        return ExecutionError::Reverted(raw.to_string());
    }
    if msg.contains("connection")
        || msg.contains("rpc error")
        || msg.contains("network error")
        || msg.contains("provider error")
        || msg.contains("econnrefused")
    {
        return ExecutionError::NodeUnavailable(raw.to_string());
    }

    ExecutionError::InternalFailure(raw.to_string())
}

/// Result type for gateway operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_insufficient_funds() {
        let err = classify("insufficient funds for gas * price + value");
        assert_eq!(err.kind(), "InsufficientBalance");
    }

    #[test]
    fn test_classify_device_errors() {
        assert_eq!(
            classify("Transaction rejected on Ledger device").kind(),
            "RejectedByUser"
        );
        assert_eq!(
            classify("Ledger device is locked. Please unlock it.").kind(),
            "DeviceLocked"
        );
        assert_eq!(
            classify("Wrong app is open. Please open the Ethereum app.").kind(),
            "WrongApplicationOpen"
        );
    }

    #[test]
    fn test_classify_timeout_is_not_revert() {
        let err = classify("request timed out after 30s");
        assert_eq!(err.kind(), "TimedOut");
        assert!(err.is_indeterminate());
    }

    #[test]
    fn test_classify_revert() {
        let err = classify("execution reverted: TRANSFER_FROM_FAILED");
        assert_eq!(err.kind(), "Reverted");
        assert!(!err.is_indeterminate());
    }

    #[test]
    fn test_classify_rpc_failure() {
        assert_eq!(
            classify("error sending request: connection refused").kind(),
            "NodeUnavailable"
        );
    }

    #[test]
    fn test_unmatched_falls_through_with_message_preserved() {
        let err = classify("some exotic upstream failure");
        assert_eq!(err.kind(), "InternalFailure");
        assert!(err.to_string().contains("some exotic upstream failure"));
    }

    #[test]
    fn test_ordering_funds_before_timeout() {
        // A message carrying both markers must classify as the more
        // specific balance failure.
        let err = classify("insufficient funds (after timeout)");
        assert_eq!(err.kind(), "InsufficientBalance");
    }
}
