//! Client-side orchestrator for on-chain bond subscription, redemption,
//! and interest-coupon claiming.
//!
//! The ledger, the contracts, and the signing provider are external
//! collaborators; this crate sequences the multi-step flows between
//! them: precondition checks before every value-moving call, price
//! refresh with a bounded convergence wait, coupon handling folded into
//! the subscribe flow as non-fatal steps, and a single-slot status
//! channel toward the embedding caller.
//!
//! Entry points:
//! - [`Orchestrator`]: the subscribe/redeem flows for one [`Session`].
//! - [`tasks::spawn_refreshers`]: session-scoped background refresh of
//!   balances, price, coupon state, and the claim countdown.
//! - [`cli`]: a thin command-line caller.

pub mod bindings;
pub mod cli;
pub mod config;
pub mod countdown;
pub mod error;
pub mod onchain;
pub mod orchestrator;
pub mod session;
pub mod status;
pub mod tasks;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Ctx, Env};
pub use error::OrchestrationError;
pub use orchestrator::{
    AccountSnapshot, HolderClass, Orchestrator, RedeemReceipt, SubscribeReceipt,
};
pub use session::Session;
pub use status::{StatusChannel, StatusEvent, StatusKind};
