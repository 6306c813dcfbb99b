//! Transaction pipeline: fee estimation, gas option construction, and
//! single-attempt submission with confirmation.

pub mod fees;
pub mod gas;
pub mod submitter;

pub use fees::{FeeEstimate, FeeEstimator, FeeMode};
pub use gas::{build_gas_options, GasOptions};
pub use submitter::{SubmissionResult, Submitter, TxIntent, TxStatus};
