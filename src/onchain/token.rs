//! ERC-20 reads and the approve send for one configured token.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;

use bondfi_evm::{Ledger, ReadError, SendError, Wallet};

use crate::bindings::IERC20;
use crate::config::TokenDescriptor;

/// Client for a single token contract.
#[derive(Debug, Clone)]
pub struct TokenClient<L> {
    ledger: L,
    pub token: TokenDescriptor,
}

impl<L> TokenClient<L> {
    pub fn new(ledger: L, token: TokenDescriptor) -> Self {
        Self { ledger, token }
    }
}

impl<L: Ledger> TokenClient<L> {
    pub async fn balance_of(&self, owner: Address) -> Result<U256, ReadError> {
        let calldata = IERC20::balanceOfCall { owner }.abi_encode();
        let data = self.ledger.read(self.token.address, calldata.into()).await?;
        Ok(IERC20::balanceOfCall::abi_decode_returns(&data)?)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ReadError> {
        let calldata = IERC20::allowanceCall { owner, spender }.abi_encode();
        let data = self.ledger.read(self.token.address, calldata.into()).await?;
        Ok(IERC20::allowanceCall::abi_decode_returns(&data)?)
    }

    /// On-chain decimals. Configuration is authoritative for amount
    /// conversion; this read exists so callers can cross-check a
    /// misconfigured descriptor.
    pub async fn decimals(&self) -> Result<u8, ReadError> {
        let calldata = IERC20::decimalsCall {}.abi_encode();
        let data = self.ledger.read(self.token.address, calldata.into()).await?;
        Ok(IERC20::decimalsCall::abi_decode_returns(&data)?)
    }
}

impl<L: Wallet> TokenClient<L> {
    /// Grant `spender` the right to move `amount` base units.
    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash, SendError> {
        let calldata = IERC20::approveCall { spender, amount }.abi_encode();
        self.ledger
            .send(
                self.token.address,
                Bytes::from(calldata),
                "ERC20 approve",
            )
            .await
    }
}
