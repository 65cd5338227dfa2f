//! The subscribe and redeem flows.
//!
//! Each flow is a strictly sequential chain of gateway interactions;
//! every step's result gates the next, and no two flows run
//! concurrently for one session (the caller disables re-invocation
//! while one is pending). Coupon steps are folded in as
//! [`CouponOutcome`] values so their failures can be surfaced without
//! aborting the flow; everything else is fatal.
//!
//! Exactly one terminal status event is published per invocation: a
//! `Success` carrying the value-moving transaction hash, or an `Error`
//! carrying the failure message.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::Notify;
use tracing::{debug, error, info};

use bondfi_base_units::{AmountError, to_base_units};
use bondfi_evm::Wallet;

use crate::config::Ctx;
use crate::error::OrchestrationError;
use crate::onchain::coupon::{CouponCoordinator, CouponOutcome, CouponState};
use crate::onchain::preconditions::check_sufficiency;
use crate::onchain::price::{DEFAULT_MAX_WAIT, PriceSync};
use crate::onchain::subscription::{SubscriptionClient, SubscriptionPreview, UserBalances};
use crate::onchain::token::TokenClient;
use crate::session::Session;
use crate::status::{StatusChannel, StatusEvent, StatusKind};

/// First-time vs. returning holder, decided once per subscribe from the
/// bond-token balance and threaded through the rest of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderClass {
    /// No bond tokens held yet; the coupon schedule does not exist.
    FirstTime,
    /// Existing holder; an outstanding coupon may be claimable.
    Returning,
}

impl HolderClass {
    fn classify(bond_balance: U256) -> Self {
        if bond_balance.is_zero() {
            Self::FirstTime
        } else {
            Self::Returning
        }
    }
}

/// Result of a completed subscribe flow.
#[derive(Debug, Clone)]
pub struct SubscribeReceipt {
    pub tx_hash: TxHash,
    pub price_cents: U256,
    pub holder_class: HolderClass,
    /// What happened on the non-fatal coupon step of this run.
    pub coupon: CouponOutcome,
}

/// Result of a completed redeem flow.
#[derive(Debug, Clone)]
pub struct RedeemReceipt {
    pub tx_hash: TxHash,
    pub price_cents: U256,
}

/// Balances and price for the session account, refreshed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub payment_balance: U256,
    pub bond_balance: U256,
    pub price_cents: U256,
}

/// Drives the multi-step flows for one session.
pub struct Orchestrator<W> {
    session: Session,
    expected_chain_id: u64,
    payment_token: TokenClient<W>,
    bond_token: TokenClient<W>,
    price: PriceSync<W>,
    coupon: CouponCoordinator<W>,
    subscription: SubscriptionClient<W>,
    spender: Address,
    status: StatusChannel,
    refresh_signal: Arc<Notify>,
}

impl<W: Wallet + Clone> Orchestrator<W> {
    pub fn new(ctx: &Ctx, wallet: W, session: Session, status: StatusChannel) -> Self {
        let contracts = &ctx.contracts;

        Self {
            session,
            expected_chain_id: ctx.chain_id,
            payment_token: TokenClient::new(wallet.clone(), contracts.payment_token),
            bond_token: TokenClient::new(wallet.clone(), contracts.bond_token),
            price: PriceSync::new(wallet.clone(), contracts.oracle),
            coupon: CouponCoordinator::new(wallet.clone(), contracts.coupon),
            subscription: SubscriptionClient::new(wallet, contracts.subscription),
            spender: contracts.subscription,
            status,
            refresh_signal: Arc::new(Notify::new()),
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    /// Notified after every completed operation; the background
    /// snapshot refresher waits on this.
    pub fn refresh_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh_signal)
    }

    /// Subscribe with a human-entered payment-token amount.
    pub async fn subscribe(&self, amount: &str) -> Result<SubscribeReceipt, OrchestrationError> {
        match self.run_subscribe(amount).await {
            Ok(receipt) => {
                info!(tx_hash = %receipt.tx_hash, "Subscription submitted");
                self.status.publish(StatusEvent::success(
                    "Subscription submitted",
                    receipt.tx_hash,
                ));
                self.refresh_signal.notify_one();
                Ok(receipt)
            }
            Err(err) => {
                error!(%err, "Subscription failed");
                self.status
                    .publish(StatusEvent::error(format!("Subscription failed: {err}")));
                Err(err)
            }
        }
    }

    /// Redeem a human-entered bond-token amount.
    pub async fn redeem(&self, amount: &str) -> Result<RedeemReceipt, OrchestrationError> {
        match self.run_redeem(amount).await {
            Ok(receipt) => {
                info!(tx_hash = %receipt.tx_hash, "Redemption submitted");
                self.status.publish(StatusEvent::success(
                    "Redemption submitted",
                    receipt.tx_hash,
                ));
                self.refresh_signal.notify_one();
                Ok(receipt)
            }
            Err(err) => {
                error!(%err, "Redemption failed");
                self.status
                    .publish(StatusEvent::error(format!("Redemption failed: {err}")));
                Err(err)
            }
        }
    }

    async fn run_subscribe(&self, amount: &str) -> Result<SubscribeReceipt, OrchestrationError> {
        self.ensure_network()?;
        let units = self.parse_positive(amount, self.payment_token.token.decimals)?;

        self.status
            .publish(StatusEvent::loading("Refreshing bond price"));
        let price_cents = self.price.refresh(DEFAULT_MAX_WAIT).await?;
        debug!(%price_cents, "Oracle price refreshed");

        let bond_balance = self.bond_token.balance_of(self.session.account).await?;
        let holder_class = HolderClass::classify(bond_balance);
        debug!(%bond_balance, ?holder_class, "Holder classified");

        let mut coupon = CouponOutcome::NotApplicable;
        if holder_class == HolderClass::Returning {
            self.status
                .publish(StatusEvent::loading("Checking outstanding coupon"));
            coupon = self.coupon.claim_if_eligible(self.session.account).await;
            self.publish_coupon_outcome(&coupon);
        }

        self.status
            .publish(StatusEvent::loading("Checking balance and allowance"));
        check_sufficiency(&self.payment_token, self.session.account, self.spender, units).await?;

        self.status
            .publish(StatusEvent::loading("Submitting subscription"));
        let tx_hash = self.subscription.subscribe(units).await?;

        if holder_class == HolderClass::FirstTime {
            coupon = self.coupon.initialize_schedule(self.session.account).await;
            self.publish_coupon_outcome(&coupon);
        }

        Ok(SubscribeReceipt {
            tx_hash,
            price_cents,
            holder_class,
            coupon,
        })
    }

    async fn run_redeem(&self, amount: &str) -> Result<RedeemReceipt, OrchestrationError> {
        self.ensure_network()?;
        let units = self.parse_positive(amount, self.bond_token.token.decimals)?;

        self.status
            .publish(StatusEvent::loading("Refreshing bond price"));
        let price_cents = self.price.refresh(DEFAULT_MAX_WAIT).await?;

        self.status
            .publish(StatusEvent::loading("Checking balance and allowance"));
        check_sufficiency(&self.bond_token, self.session.account, self.spender, units).await?;

        self.status
            .publish(StatusEvent::loading("Submitting redemption"));
        let tx_hash = self.subscription.redeem(units).await?;

        Ok(RedeemReceipt {
            tx_hash,
            price_cents,
        })
    }

    /// Balances plus passive price, read together for the caller's
    /// account display and the background refresher.
    pub async fn snapshot(&self) -> Result<AccountSnapshot, OrchestrationError> {
        let payment_balance = self.payment_token.balance_of(self.session.account).await?;
        let bond_balance = self.bond_token.balance_of(self.session.account).await?;
        let price_cents = self.price.current().await?;

        Ok(AccountSnapshot {
            payment_balance,
            bond_balance,
            price_cents,
        })
    }

    /// Read-through coupon state for the session account.
    pub async fn coupon_state(&self) -> Result<CouponState, OrchestrationError> {
        Ok(self.coupon.snapshot(self.session.account).await?)
    }

    /// Quote a subscription without sending anything.
    pub async fn preview(&self, amount: &str) -> Result<SubscriptionPreview, OrchestrationError> {
        let units = self.parse_positive(amount, self.payment_token.token.decimals)?;
        Ok(self.subscription.preview_subscription(units).await?)
    }

    /// The subscription contract's own record of the user's deposits
    /// and shares.
    pub async fn user_balances(&self) -> Result<UserBalances, OrchestrationError> {
        Ok(self.subscription.user_balances(self.session.account).await?)
    }

    /// Approve the subscription contract for a payment-token amount.
    /// Zero is allowed here: it revokes the approval.
    pub async fn approve_payment(&self, amount: &str) -> Result<TxHash, OrchestrationError> {
        let units = to_base_units(amount, self.payment_token.token.decimals)?;
        Ok(self.payment_token.approve(self.spender, units).await?)
    }

    fn ensure_network(&self) -> Result<(), OrchestrationError> {
        if self.session.chain_id != self.expected_chain_id {
            return Err(OrchestrationError::NetworkMismatch {
                expected: self.expected_chain_id,
                actual: self.session.chain_id,
            });
        }
        Ok(())
    }

    fn parse_positive(&self, amount: &str, decimals: u8) -> Result<U256, OrchestrationError> {
        let units = to_base_units(amount, decimals)?;
        if units.is_zero() {
            return Err(OrchestrationError::InvalidAmount(AmountError::Zero));
        }
        Ok(units)
    }

    fn publish_coupon_outcome(&self, outcome: &CouponOutcome) {
        let event = match outcome {
            CouponOutcome::NotApplicable => return,
            CouponOutcome::Claimed(tx_hash) => StatusEvent {
                kind: StatusKind::Info,
                message: "Outstanding coupon claimed".to_string(),
                tx_hash: Some(*tx_hash),
            },
            CouponOutcome::ClaimFailed(reason) => StatusEvent::info(format!(
                "Coupon claim failed (subscription continues): {reason}"
            )),
            CouponOutcome::ScheduleInitialized(tx_hash) => StatusEvent {
                kind: StatusKind::Info,
                message: "Coupon claim schedule initialized".to_string(),
                tx_hash: Some(*tx_hash),
            },
            CouponOutcome::ScheduleInitFailed(reason) => StatusEvent::info(format!(
                "Coupon schedule initialization failed (subscription succeeded): {reason}"
            )),
        };

        self.status.publish(event);
    }
}
