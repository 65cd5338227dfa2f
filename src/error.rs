//! Error taxonomy for the orchestration core.
//!
//! Local validation and precondition failures abort before anything is
//! sent; gateway failures pass the underlying message through. Coupon
//! step failures are deliberately absent: they are data
//! ([`CouponOutcome`](crate::onchain::coupon::CouponOutcome) variants),
//! not errors, because they must never abort an enclosing flow.

use alloy::primitives::U256;

use bondfi_base_units::AmountError;
use bondfi_evm::{ReadError, SendError};

use crate::onchain::price::PriceSyncError;

/// A fatal failure of a subscribe or redeem flow.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// The entered amount failed local validation; nothing reached the
    /// network.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// The owner's token balance does not cover the required amount.
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: U256, required: U256 },

    /// The spender's allowance does not cover the required amount.
    #[error("insufficient allowance: approved {allowance}, need {required}")]
    InsufficientAllowance { allowance: U256, required: U256 },

    /// The session is connected to a different network than the one the
    /// contracts are configured for. Not retryable.
    #[error("connected to chain {actual} but configured for chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("ledger read failed: {0}")]
    RemoteRead(#[from] ReadError),

    #[error("ledger send failed: {0}")]
    RemoteSend(#[from] SendError),
}

impl From<PriceSyncError> for OrchestrationError {
    fn from(err: PriceSyncError) -> Self {
        match err {
            PriceSyncError::Read(read) => Self::RemoteRead(read),
            PriceSyncError::Send(send) => Self::RemoteSend(send),
        }
    }
}
