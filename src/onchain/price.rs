//! Price synchronization against the oracle contract.
//!
//! The oracle refreshes asynchronously: a price-update request is a
//! transaction, and the new value lands in a later block. [`refresh`]
//! therefore submits the request and then polls the read side up to a
//! bounded deadline. This is a best-effort convergence wait, never a
//! guarantee of a changed price; hitting the deadline returns the last
//! observed value instead of failing.
//!
//! [`refresh`]: PriceSync::refresh

use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use tokio::time::{Instant, sleep};
use tracing::debug;

use bondfi_evm::{ReadError, SendError, Wallet};

use crate::bindings::IPriceOracle;

/// How long [`PriceSync::refresh`] waits for a non-zero read by default.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Fixed cadence between oracle re-reads while waiting.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum PriceSyncError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Oracle price reads plus the refresh-and-poll convergence wait.
#[derive(Debug, Clone)]
pub struct PriceSync<W> {
    wallet: W,
    oracle: Address,
}

impl<W: Wallet> PriceSync<W> {
    pub fn new(wallet: W, oracle: Address) -> Self {
        Self { wallet, oracle }
    }

    /// The oracle's current USD price in cents, read passively.
    pub async fn current(&self) -> Result<U256, ReadError> {
        let calldata = IPriceOracle::getLatestPriceUSDCall {}.abi_encode();
        let data = self.wallet.read(self.oracle, calldata.into()).await?;
        Ok(IPriceOracle::getLatestPriceUSDCall::abi_decode_returns(
            &data,
        )?)
    }

    /// Request an oracle update, then poll until a read returns a
    /// non-zero value or `max_wait` elapses, whichever first.
    ///
    /// Returns the last observed value either way. A zero read is
    /// treated as "not yet updated" (the oracle quotes whole USD cents;
    /// a true zero price is meaningless), so a still-zero value at the
    /// deadline comes back to the caller rather than becoming an error.
    pub async fn refresh(&self, max_wait: Duration) -> Result<U256, PriceSyncError> {
        let calldata = IPriceOracle::requestPriceUpdateCall {}.abi_encode();
        self.wallet
            .send(self.oracle, Bytes::from(calldata), "request oracle price update")
            .await?;

        let started = Instant::now();
        let mut last_observed = self.current().await?;

        while last_observed.is_zero() && started.elapsed() < max_wait {
            sleep(POLL_INTERVAL).await;
            last_observed = self.current().await?;
        }

        if last_observed.is_zero() {
            debug!(
                waited_ms = started.elapsed().as_millis(),
                "Oracle price still unset after deadline"
            );
        }

        Ok(last_observed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::sol_types::SolValue;

    use super::*;
    use crate::test_utils::MockLedger;

    const ORACLE: Address = Address::repeat_byte(0x03);

    fn price_sync(ledger: &Arc<MockLedger>) -> PriceSync<Arc<MockLedger>> {
        PriceSync::new(Arc::clone(ledger), ORACLE)
    }

    #[tokio::test]
    async fn current_reads_price() {
        let ledger = Arc::new(MockLedger::new());
        ledger.queue_read(
            ORACLE,
            IPriceOracle::getLatestPriceUSDCall::SELECTOR,
            U256::from(10_250).abi_encode(),
        );

        let price = price_sync(&ledger).current().await.unwrap();

        assert_eq!(price, U256::from(10_250));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_stops_on_first_non_zero_read() {
        let ledger = Arc::new(MockLedger::new());
        ledger.queue_read(
            ORACLE,
            IPriceOracle::getLatestPriceUSDCall::SELECTOR,
            U256::from(10_250).abi_encode(),
        );

        let price = price_sync(&ledger)
            .refresh(DEFAULT_MAX_WAIT)
            .await
            .unwrap();

        assert_eq!(price, U256::from(10_250));
        // one update-request send, one immediate read, zero polls
        assert_eq!(ledger.sent().len(), 1);
        assert_eq!(
            ledger.reads_of(ORACLE, IPriceOracle::getLatestPriceUSDCall::SELECTOR),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_polls_until_value_appears() {
        let ledger = Arc::new(MockLedger::new());
        let selector = IPriceOracle::getLatestPriceUSDCall::SELECTOR;

        // three zero reads, then the updated value
        for _ in 0..3 {
            ledger.queue_read(ORACLE, selector, U256::ZERO.abi_encode());
        }
        ledger.queue_read(ORACLE, selector, U256::from(9_900).abi_encode());

        let price = price_sync(&ledger)
            .refresh(DEFAULT_MAX_WAIT)
            .await
            .unwrap();

        assert_eq!(price, U256::from(9_900));
        assert_eq!(ledger.reads_of(ORACLE, selector), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_returns_last_observed_value_at_deadline() {
        let ledger = Arc::new(MockLedger::new());
        let selector = IPriceOracle::getLatestPriceUSDCall::SELECTOR;

        // the oracle never produces a value
        ledger.set_default_read(ORACLE, selector, U256::ZERO.abi_encode());

        let price = price_sync(&ledger)
            .refresh(Duration::from_secs(10))
            .await
            .unwrap();

        // not an error: the last observed (unchanged) value comes back
        assert_eq!(price, U256::ZERO);
        // one immediate read plus ten polls at 1 s cadence
        assert_eq!(ledger.reads_of(ORACLE, selector), 11);
    }

    #[tokio::test]
    async fn refresh_propagates_send_failure() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_sends(
            ORACLE,
            IPriceOracle::requestPriceUpdateCall::SELECTOR,
            "out of gas",
        );

        let error = price_sync(&ledger)
            .refresh(DEFAULT_MAX_WAIT)
            .await
            .unwrap_err();

        assert!(
            matches!(error, PriceSyncError::Send(_)),
            "unexpected error: {error:?}"
        );
    }
}
