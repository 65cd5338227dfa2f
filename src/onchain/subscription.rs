//! Subscription contract client: the two value-moving operations plus
//! their read-only companions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;

use bondfi_evm::{Ledger, ReadError, SendError, Wallet};

use crate::bindings::IBondSubscription;

/// The contract's view of one user's holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserBalances {
    /// Payment-token base units held by the contract for the user.
    pub payment: U256,
    /// Bond share base units.
    pub shares: U256,
}

/// Result of a dry-run subscription quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPreview {
    pub shares_to_receive: U256,
    pub payment_required: U256,
    pub price_cents: U256,
}

#[derive(Debug, Clone)]
pub struct SubscriptionClient<L> {
    ledger: L,
    contract: Address,
}

impl<L> SubscriptionClient<L> {
    pub fn new(ledger: L, contract: Address) -> Self {
        Self { ledger, contract }
    }
}

impl<L: Ledger> SubscriptionClient<L> {
    pub async fn issuer(&self) -> Result<Address, ReadError> {
        let calldata = IBondSubscription::issuerCall {}.abi_encode();
        let data = self.ledger.read(self.contract, calldata.into()).await?;
        Ok(IBondSubscription::issuerCall::abi_decode_returns(&data)?)
    }

    pub async fn user_balances(&self, user: Address) -> Result<UserBalances, ReadError> {
        let calldata = IBondSubscription::getUserBalancesCall { user }.abi_encode();
        let data = self.ledger.read(self.contract, calldata.into()).await?;
        let returns = IBondSubscription::getUserBalancesCall::abi_decode_returns(&data)?;

        Ok(UserBalances {
            payment: returns.usdt,
            shares: returns.shares,
        })
    }

    pub async fn preview_subscription(
        &self,
        amount: U256,
    ) -> Result<SubscriptionPreview, ReadError> {
        let calldata = IBondSubscription::previewSubscriptionCall { amount }.abi_encode();
        let data = self.ledger.read(self.contract, calldata.into()).await?;
        let returns = IBondSubscription::previewSubscriptionCall::abi_decode_returns(&data)?;

        Ok(SubscriptionPreview {
            shares_to_receive: returns.sharesToReceive,
            payment_required: returns.actualUsdtNeeded,
            price_cents: returns.priceCents,
        })
    }
}

impl<L: Wallet> SubscriptionClient<L> {
    /// Submit `subscribe(amount)`. The amount is in payment-token base
    /// units; preconditions are the caller's responsibility.
    pub async fn subscribe(&self, amount: U256) -> Result<TxHash, SendError> {
        let calldata = IBondSubscription::subscribeCall {
            amountInSmallestUnit: amount,
        }
        .abi_encode();

        self.ledger
            .send(self.contract, Bytes::from(calldata), "bond subscription")
            .await
    }

    /// Submit `redeem(amount)`. The amount is in bond-token base units.
    pub async fn redeem(&self, amount: U256) -> Result<TxHash, SendError> {
        let calldata = IBondSubscription::redeemCall {
            amountInSmallestUnit: amount,
        }
        .abi_encode();

        self.ledger
            .send(self.contract, Bytes::from(calldata), "bond redemption")
            .await
    }
}
