//! Coupon eligibility, automatic claiming, and schedule initialization.
//!
//! Coupon interaction is an optimization of the subscribe flow, never a
//! precondition for it. Failures on this path are therefore values
//! ([`CouponOutcome`]), not errors: the coordinator logs them and hands
//! them back for the executor to surface as informational status while
//! the enclosing flow continues.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use tracing::{info, warn};

use bondfi_evm::{ReadError, Wallet};

use crate::bindings::ICouponDistributor;

/// Read-through snapshot of the coupon contract's view of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponState {
    /// Unix timestamp of the next claim window; zero when the schedule
    /// was never initialized.
    pub next_claim_time: u64,
    /// Accrued coupon amount in payment-token base units.
    pub claimable: U256,
    pub can_claim: bool,
    /// Derived: the distributor exposes no dedicated getter, but an
    /// initialized schedule always carries a non-zero next claim time.
    pub initialized: bool,
}

/// What happened on a coupon step of a subscribe flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponOutcome {
    /// No claim was due (or the account is a first-time holder with no
    /// schedule yet).
    NotApplicable,
    /// An outstanding coupon was claimed before the subscription.
    Claimed(TxHash),
    /// The claim attempt failed; the subscribe flow continues.
    ClaimFailed(String),
    /// First-time subscription: the claim schedule was set up.
    ScheduleInitialized(TxHash),
    /// Schedule setup failed; the subscription itself still succeeded.
    ScheduleInitFailed(String),
}

/// Coordinates coupon reads and claims against the distributor contract.
#[derive(Debug, Clone)]
pub struct CouponCoordinator<W> {
    wallet: W,
    distributor: Address,
}

impl<W: Wallet> CouponCoordinator<W> {
    pub fn new(wallet: W, distributor: Address) -> Self {
        Self { wallet, distributor }
    }

    /// Returning-holder path: claim the outstanding coupon when one is
    /// due. Any failure, read or send, degrades to
    /// [`CouponOutcome::ClaimFailed`].
    pub async fn claim_if_eligible(&self, account: Address) -> CouponOutcome {
        let can_claim = match self.can_claim(account).await {
            Ok(can_claim) => can_claim,
            Err(error) => {
                warn!(%account, %error, "Coupon eligibility read failed");
                return CouponOutcome::ClaimFailed(error.to_string());
            }
        };

        if !can_claim {
            return CouponOutcome::NotApplicable;
        }

        let calldata = ICouponDistributor::claimCouponCall {}.abi_encode();
        match self
            .wallet
            .send(self.distributor, Bytes::from(calldata), "claim coupon")
            .await
        {
            Ok(tx_hash) => {
                info!(%account, %tx_hash, "Outstanding coupon claimed");
                CouponOutcome::Claimed(tx_hash)
            }
            Err(error) => {
                warn!(%account, %error, "Coupon claim failed");
                CouponOutcome::ClaimFailed(error.to_string())
            }
        }
    }

    /// First-time-holder path, invoked only after a successful
    /// subscribe send: set up the account's claim schedule. Failure
    /// degrades to [`CouponOutcome::ScheduleInitFailed`].
    pub async fn initialize_schedule(&self, account: Address) -> CouponOutcome {
        let calldata = ICouponDistributor::initializeClaimCall { user: account }.abi_encode();
        match self
            .wallet
            .send(
                self.distributor,
                Bytes::from(calldata),
                "initialize coupon claim schedule",
            )
            .await
        {
            Ok(tx_hash) => {
                info!(%account, %tx_hash, "Coupon claim schedule initialized");
                CouponOutcome::ScheduleInitialized(tx_hash)
            }
            Err(error) => {
                warn!(%account, %error, "Coupon schedule initialization failed");
                CouponOutcome::ScheduleInitFailed(error.to_string())
            }
        }
    }

    /// Combined read-through of the distributor's per-account state,
    /// used by the background refresh and the status display.
    pub async fn snapshot(&self, account: Address) -> Result<CouponState, ReadError> {
        let next_claim_time = self.next_claim_time(account).await?;
        let claimable = self.claimable(account).await?;
        let can_claim = self.can_claim(account).await?;

        Ok(CouponState {
            next_claim_time,
            claimable,
            can_claim,
            initialized: next_claim_time != 0,
        })
    }

    async fn can_claim(&self, account: Address) -> Result<bool, ReadError> {
        let calldata = ICouponDistributor::canClaimCall { user: account }.abi_encode();
        let data = self.wallet.read(self.distributor, calldata.into()).await?;
        Ok(ICouponDistributor::canClaimCall::abi_decode_returns(&data)?)
    }

    async fn claimable(&self, account: Address) -> Result<U256, ReadError> {
        let calldata = ICouponDistributor::calculateCouponCall { user: account }.abi_encode();
        let data = self.wallet.read(self.distributor, calldata.into()).await?;
        Ok(ICouponDistributor::calculateCouponCall::abi_decode_returns(
            &data,
        )?)
    }

    async fn next_claim_time(&self, account: Address) -> Result<u64, ReadError> {
        let calldata = ICouponDistributor::getNextClaimTimeCall { user: account }.abi_encode();
        let data = self.wallet.read(self.distributor, calldata.into()).await?;
        let raw = ICouponDistributor::getNextClaimTimeCall::abi_decode_returns(&data)?;
        // a timestamp past u64 range is garbage; saturate rather than fail
        Ok(u64::try_from(raw).unwrap_or(u64::MAX))
    }
}
