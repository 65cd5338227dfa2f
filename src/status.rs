//! Single-slot status channel between the orchestrator and its caller.
//!
//! Only the most recent event matters to a consumer (a UI renders one
//! status line, not a log), so the channel is a `tokio::sync::watch`
//! slot: `publish` replaces, subscribers observe last-write-wins.

use alloy::primitives::TxHash;
use tokio::sync::watch;

/// Severity of a [`StatusEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// A step of a flow is in progress.
    Loading,
    /// The operation completed; `tx_hash` carries the ledger record.
    Success,
    /// The operation failed; `message` is human-readable.
    Error,
    /// Non-fatal information, e.g. a skipped coupon claim.
    Info,
}

/// One immutable status notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub message: String,
    pub tx_hash: Option<TxHash>,
}

impl StatusEvent {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            message: message.into(),
            tx_hash: None,
        }
    }

    pub fn success(message: impl Into<String>, tx_hash: TxHash) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
            tx_hash: Some(tx_hash),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
            tx_hash: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
            tx_hash: None,
        }
    }
}

/// Holder of the latest [`StatusEvent`].
#[derive(Debug, Clone)]
pub struct StatusChannel {
    slot: watch::Sender<Option<StatusEvent>>,
}

impl StatusChannel {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Replace the current event and wake subscribers.
    pub fn publish(&self, event: StatusEvent) {
        self.slot.send_replace(Some(event));
    }

    /// Empty the slot.
    pub fn clear(&self) {
        self.slot.send_replace(None);
    }

    /// The current event, if any.
    pub fn latest(&self) -> Option<StatusEvent> {
        self.slot.borrow().clone()
    }

    /// Hand out a receiver observing every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusEvent>> {
        self.slot.subscribe()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;

    use super::*;

    #[test]
    fn publish_replaces_previous_event() {
        let channel = StatusChannel::new();

        channel.publish(StatusEvent::loading("step one"));
        channel.publish(StatusEvent::loading("step two"));

        let latest = channel.latest().unwrap();
        assert_eq!(latest.message, "step two");
    }

    #[test]
    fn clear_empties_the_slot() {
        let channel = StatusChannel::new();

        channel.publish(StatusEvent::info("hello"));
        channel.clear();

        assert!(channel.latest().is_none());
    }

    #[test]
    fn success_carries_transaction_hash() {
        let tx = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let event = StatusEvent::success("done", tx);

        assert_eq!(event.kind, StatusKind::Success);
        assert_eq!(event.tx_hash, Some(tx));
    }

    #[tokio::test]
    async fn subscriber_observes_last_write() {
        let channel = StatusChannel::new();
        let mut receiver = channel.subscribe();

        channel.publish(StatusEvent::loading("first"));
        channel.publish(StatusEvent::error("second"));

        receiver.changed().await.unwrap();
        let observed = receiver.borrow_and_update().clone().unwrap();

        assert_eq!(observed.kind, StatusKind::Error);
        assert_eq!(observed.message, "second");
    }
}
