//! Session-scoped background refresh tasks.
//!
//! Three refreshers run independently of any in-flight flow: the
//! account snapshot (balances + passive price, refreshed at spawn and
//! whenever an operation completes), the coupon state (fixed 30 s
//! cadence with bounded jitter), and the countdown label (fixed 60 s
//! cadence). All are bound to one session: an account or network
//! change means tearing the [`SessionTasks`] down and spawning fresh
//! ones, and teardown aborts every task so nothing keeps polling for a
//! stale account.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::warn;

use bondfi_evm::Wallet;

use crate::config::RefreshCtx;
use crate::countdown::{Countdown, describe_remaining};
use crate::onchain::coupon::CouponState;
use crate::orchestrator::{AccountSnapshot, Orchestrator};

/// Watch receivers the caller renders from. Each holds the latest
/// refreshed value, `None` until the first successful refresh.
pub struct RefreshFeeds {
    pub snapshot: watch::Receiver<Option<AccountSnapshot>>,
    pub coupon: watch::Receiver<Option<CouponState>>,
    pub countdown: watch::Receiver<Option<Countdown>>,
}

/// Handles of the spawned refreshers. Dropping aborts them; prefer
/// [`shutdown`](Self::shutdown) to also wait for termination.
pub struct SessionTasks {
    handles: Vec<JoinHandle<()>>,
}

impl SessionTasks {
    /// Abort every refresher and wait until each has stopped.
    pub async fn shutdown(mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
            // cancellation surfaces as a JoinError; nothing to report
            let _ = handle.await;
        }
    }
}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Spawn the three refreshers for the orchestrator's session.
pub fn spawn_refreshers<W>(
    orchestrator: Arc<Orchestrator<W>>,
    config: RefreshCtx,
) -> (SessionTasks, RefreshFeeds)
where
    W: Wallet + Clone + 'static,
{
    let (snapshot_slot, snapshot) = watch::channel(None);
    let (coupon_slot, coupon) = watch::channel(None);
    let (countdown_slot, countdown) = watch::channel(None);

    let snapshot_task = tokio::spawn(run_snapshot_refresher(
        Arc::clone(&orchestrator),
        snapshot_slot,
    ));
    let coupon_task = tokio::spawn(run_coupon_refresher(
        Arc::clone(&orchestrator),
        config,
        coupon_slot,
    ));
    let countdown_task = tokio::spawn(run_countdown_refresher(
        config,
        coupon.clone(),
        countdown_slot,
    ));

    let tasks = SessionTasks {
        handles: vec![snapshot_task, coupon_task, countdown_task],
    };
    let feeds = RefreshFeeds {
        snapshot,
        coupon,
        countdown,
    };

    (tasks, feeds)
}

/// Refresh once at spawn, then whenever the orchestrator signals a
/// completed operation.
async fn run_snapshot_refresher<W: Wallet + Clone>(
    orchestrator: Arc<Orchestrator<W>>,
    slot: watch::Sender<Option<AccountSnapshot>>,
) {
    let signal = orchestrator.refresh_signal();

    loop {
        match orchestrator.snapshot().await {
            Ok(snapshot) => {
                slot.send_replace(Some(snapshot));
            }
            Err(error) => warn!(%error, "Account snapshot refresh failed"),
        }

        signal.notified().await;
    }
}

async fn run_coupon_refresher<W: Wallet + Clone>(
    orchestrator: Arc<Orchestrator<W>>,
    config: RefreshCtx,
    slot: watch::Sender<Option<CouponState>>,
) {
    let mut ticker = interval(config.coupon_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        jittered_delay(config.max_jitter).await;

        match orchestrator.coupon_state().await {
            Ok(state) => {
                slot.send_replace(Some(state));
            }
            Err(error) => warn!(%error, "Coupon state refresh failed"),
        }
    }
}

async fn run_countdown_refresher(
    config: RefreshCtx,
    coupon: watch::Receiver<Option<CouponState>>,
    slot: watch::Sender<Option<Countdown>>,
) {
    let mut ticker = interval(config.countdown_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(state) = *coupon.borrow() else {
            // nothing to count down until the coupon state first lands
            continue;
        };

        slot.send_replace(Some(describe_remaining(state.next_claim_time, unix_now())));
    }
}

/// Spread the polling of many concurrent sessions over the interval.
async fn jittered_delay(max_jitter: Duration) {
    if max_jitter.is_zero() {
        return;
    }

    let bound = u64::try_from(max_jitter.as_millis()).unwrap_or(u64::MAX);
    let millis = rand::rng().random_range(0..=bound);
    sleep(Duration::from_millis(millis)).await;
}

pub(crate) fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
