//! Active user session.
//!
//! Connection lifecycle (wallet pairing, account and network switches)
//! belongs to the embedding caller; the orchestrator only reads the
//! session it is handed. A new account or network means a new
//! `Session`, and with it a teardown/respawn of the background
//! refreshers (see [`tasks`](crate::tasks)).

use alloy::primitives::Address;

/// The identity one orchestrator instance operates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// The connected account; owner of balances and signer of sends.
    pub account: Address,
    /// The chain the session's provider is actually connected to.
    pub chain_id: u64,
}

impl Session {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id }
    }
}
