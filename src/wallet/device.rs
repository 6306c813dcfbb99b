//! Hardware signing device boundary
//!
//! The device transport (Ledger or similar) is an external
//! collaborator; this module defines the contract the execution core
//! needs and the device-state failures it must surface distinctly.
//! Each failure is terminal and requires human intervention on the
//! device, never an automatic retry.

use crate::error::ExecutionError;

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes};
use thiserror::Error;

/// Device-side failures, kept separate from the gateway taxonomy so a
/// transport implementation never needs to know about it.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("transaction rejected by user on the device")]
    RejectedByUser,

    #[error("device is locked")]
    Locked,

    #[error("wrong application open on the device")]
    WrongApplication,

    #[error("device transport error: {0}")]
    Transport(String),
}

impl From<DeviceError> for ExecutionError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::RejectedByUser => ExecutionError::RejectedByUser,
            DeviceError::Locked => ExecutionError::DeviceLocked,
            DeviceError::WrongApplication => ExecutionError::WrongApplicationOpen,
            DeviceError::Transport(msg) => ExecutionError::InternalFailure(msg),
        }
    }
}

/// External hardware signer: signs a fully-built unsigned transaction
/// and returns the encoded signed transaction. Broadcast stays with
/// the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HardwareDevice: Send + Sync {
    async fn sign_transaction(
        &self,
        address: Address,
        tx: &TypedTransaction,
    ) -> Result<Bytes, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_errors_map_into_taxonomy() {
        assert_eq!(
            ExecutionError::from(DeviceError::RejectedByUser).kind(),
            "RejectedByUser"
        );
        assert_eq!(ExecutionError::from(DeviceError::Locked).kind(), "DeviceLocked");
        assert_eq!(
            ExecutionError::from(DeviceError::WrongApplication).kind(),
            "WrongApplicationOpen"
        );
        assert_eq!(
            ExecutionError::from(DeviceError::Transport("usb".to_string())).kind(),
            "InternalFailure"
        );
    }
}
