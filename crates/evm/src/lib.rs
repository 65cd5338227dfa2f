//! EVM ledger gateway for the bondfi orchestrator.
//!
//! Two traits form the boundary between orchestration logic and the
//! chain:
//!
//! - [`Ledger`]: read-only access, an `eth_call` façade that extracts
//!   the revert reason from failed view calls.
//! - [`Wallet`]: extends `Ledger` with a signing identity and
//!   transaction submission. `send` is synchronous-to-submission: it
//!   resolves with the transaction hash once the node accepts the
//!   transaction, without waiting for confirmation. Callers that need a
//!   confirmed state poll `read` separately.
//!
//! No retry happens inside the gateway; retry policy (where one exists
//! at all) belongs to the caller.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, WalletProvider};
use alloy::sol_types::{Revert, SolError};
use async_trait::async_trait;
use tracing::info;

/// A failed `eth_call`.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("call reverted: {0}")]
    Reverted(String),
    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("malformed return data: {0}")]
    Decode(#[from] alloy::sol_types::Error),
}

/// A transaction the node refused to accept.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
}

/// Read-only ledger access.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Execute a view call against `contract` with ABI-encoded
    /// `calldata`, returning the raw return data.
    ///
    /// A revert carrying a standard `Error(string)` payload is decoded
    /// into [`ReadError::Reverted`] with the contract's message.
    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes, ReadError>;
}

/// Signing ledger access.
///
/// Extends [`Ledger`] with the session's signing identity and
/// state-changing call submission.
#[async_trait]
pub trait Wallet: Ledger {
    /// The address this wallet signs transactions from.
    fn address(&self) -> Address;

    /// Submit a signed contract call.
    ///
    /// Resolves with the transaction hash as soon as the node accepts
    /// the transaction. `note` is a human-readable operation description
    /// used for logging.
    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
        note: &str,
    ) -> Result<TxHash, SendError>;
}

#[async_trait]
impl<T: Ledger> Ledger for Arc<T> {
    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes, ReadError> {
        (**self).read(contract, calldata).await
    }
}

#[async_trait]
impl<T: Wallet> Wallet for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
        note: &str,
    ) -> Result<TxHash, SendError> {
        (**self).send(contract, calldata, note).await
    }
}

/// Wallet backed by a provider with an embedded local signer.
///
/// Wraps a provider built with a wallet filler (e.g.
/// `ProviderBuilder::new().wallet(wallet).connect_http(...)`). The
/// signing address is the provider's default signer, so no separate
/// address parameter is needed.
pub struct PrivateKeyWallet<P> {
    provider: P,
}

impl<P> PrivateKeyWallet<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> Ledger for PrivateKeyWallet<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes, ReadError> {
        let tx = alloy::rpc::types::TransactionRequest::default()
            .to(contract)
            .input(calldata.into());

        match self.provider.call(tx).await {
            Ok(result) => Ok(result),
            Err(rpc_err) => Err(decode_read_error(rpc_err)),
        }
    }
}

#[async_trait]
impl<P> Wallet for PrivateKeyWallet<P>
where
    P: Provider + WalletProvider + Clone + Send + Sync + 'static,
{
    fn address(&self) -> Address {
        self.provider.default_signer_address()
    }

    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
        note: &str,
    ) -> Result<TxHash, SendError> {
        info!(%contract, note, "Submitting contract call");

        let tx = alloy::rpc::types::TransactionRequest::default()
            .to(contract)
            .input(calldata.into());

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();

        info!(%tx_hash, note, "Transaction accepted");

        Ok(tx_hash)
    }
}

/// Pulls the revert payload out of a failed call and decodes the
/// standard `Error(string)` reason where present.
fn decode_read_error(
    rpc_err: alloy::transports::RpcError<alloy::transports::TransportErrorKind>,
) -> ReadError {
    // Wrap in alloy::contract::Error to reuse its revert data extraction
    let contract_err = alloy::contract::Error::TransportError(rpc_err);

    let Some(revert_data) = contract_err.as_revert_data() else {
        return match contract_err {
            alloy::contract::Error::TransportError(rpc_err) => ReadError::Transport(rpc_err),
            other => ReadError::Reverted(other.to_string()),
        };
    };

    match Revert::abi_decode(revert_data.as_ref()) {
        Ok(revert) => ReadError::Reverted(revert.reason),
        Err(_) => ReadError::Reverted(format!("raw revert data: {revert_data}")),
    }
}
