//! CLI commands for driving the orchestrator manually.

use std::io::Write;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use bondfi_base_units::{format_usd_cents, from_base_units};
use bondfi_evm::{PrivateKeyWallet, Wallet};

use crate::config::{Ctx, Env};
use crate::countdown::describe_remaining;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use crate::status::{StatusChannel, StatusEvent};
use crate::tasks::unix_now;

#[derive(Parser, Debug)]
#[command(name = "bondfi", about = "On-chain bond subscription orchestrator")]
pub struct Cli {
    #[clap(flatten)]
    pub env: Env,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Subscribe with a payment-token amount (e.g. "100.00")
    Subscribe { amount: String },
    /// Redeem a bond-token amount
    Redeem { amount: String },
    /// Approve the subscription contract to spend a payment-token amount
    Approve { amount: String },
    /// Quote a subscription without sending anything
    Preview { amount: String },
    /// Show balances, price, and coupon status
    Status,
}

pub async fn run(ctx: Ctx, command: Command) -> anyhow::Result<()> {
    let orchestrator = connect(&ctx).await?;
    let mut stdout = std::io::stdout();

    match command {
        Command::Subscribe { amount } => {
            subscribe_command(&mut stdout, &orchestrator, &amount).await
        }
        Command::Redeem { amount } => redeem_command(&mut stdout, &orchestrator, &amount).await,
        Command::Approve { amount } => approve_command(&mut stdout, &orchestrator, &amount).await,
        Command::Preview { amount } => preview_command(&mut stdout, &orchestrator, &amount).await,
        Command::Status => status_command(&mut stdout, &orchestrator, &ctx).await,
    }
}

async fn connect(ctx: &Ctx) -> anyhow::Result<Orchestrator<impl Wallet + Clone>> {
    let signer =
        PrivateKeySigner::from_bytes(&ctx.signer_key).context("invalid signer private key")?;
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(ctx.rpc_url.clone());

    let chain_id = provider
        .get_chain_id()
        .await
        .context("failed to query chain id")?;

    let wallet = Arc::new(PrivateKeyWallet::new(provider));
    let session = Session::new(wallet.address(), chain_id);
    ctx.ensure_network(&session)?;

    info!(account = %session.account, chain_id, "Session connected");

    Ok(Orchestrator::new(
        ctx,
        wallet,
        session,
        StatusChannel::new(),
    ))
}

/// Mirror status events to the log while a flow runs.
fn spawn_status_printer(mut events: watch::Receiver<Option<StatusEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while events.changed().await.is_ok() {
            let event = events.borrow_and_update().clone();
            if let Some(StatusEvent { kind, message, .. }) = event {
                info!(?kind, "{message}");
            }
        }
    })
}

async fn subscribe_command<W: Write, L: Wallet + Clone>(
    stdout: &mut W,
    orchestrator: &Orchestrator<L>,
    amount: &str,
) -> anyhow::Result<()> {
    let printer = spawn_status_printer(orchestrator.status().subscribe());
    let result = orchestrator.subscribe(amount).await;
    printer.abort();

    match result {
        Ok(receipt) => {
            writeln!(stdout, "✅ Subscription submitted")?;
            writeln!(stdout, "   Transaction: {}", receipt.tx_hash)?;
            writeln!(
                stdout,
                "   Price: ${} per share",
                format_usd_cents(receipt.price_cents)
            )?;
            writeln!(stdout, "   Coupon step: {:?}", receipt.coupon)?;
            Ok(())
        }
        Err(e) => {
            writeln!(stdout, "❌ Subscription failed: {e}")?;
            Err(e.into())
        }
    }
}

async fn redeem_command<W: Write, L: Wallet + Clone>(
    stdout: &mut W,
    orchestrator: &Orchestrator<L>,
    amount: &str,
) -> anyhow::Result<()> {
    let printer = spawn_status_printer(orchestrator.status().subscribe());
    let result = orchestrator.redeem(amount).await;
    printer.abort();

    match result {
        Ok(receipt) => {
            writeln!(stdout, "✅ Redemption submitted")?;
            writeln!(stdout, "   Transaction: {}", receipt.tx_hash)?;
            Ok(())
        }
        Err(e) => {
            writeln!(stdout, "❌ Redemption failed: {e}")?;
            Err(e.into())
        }
    }
}

async fn approve_command<W: Write, L: Wallet + Clone>(
    stdout: &mut W,
    orchestrator: &Orchestrator<L>,
    amount: &str,
) -> anyhow::Result<()> {
    let tx_hash = orchestrator.approve_payment(amount).await?;

    writeln!(stdout, "✅ Approval submitted")?;
    writeln!(stdout, "   Transaction: {tx_hash}")?;
    Ok(())
}

async fn preview_command<W: Write, L: Wallet + Clone>(
    stdout: &mut W,
    orchestrator: &Orchestrator<L>,
    amount: &str,
) -> anyhow::Result<()> {
    let preview = orchestrator.preview(amount).await?;

    writeln!(stdout, "🔍 Subscription preview for {amount}")?;
    writeln!(stdout, "   Shares to receive: {}", preview.shares_to_receive)?;
    writeln!(stdout, "   Payment required:  {}", preview.payment_required)?;
    writeln!(
        stdout,
        "   Price: ${} per share",
        format_usd_cents(preview.price_cents)
    )?;
    Ok(())
}

async fn status_command<W: Write, L: Wallet + Clone>(
    stdout: &mut W,
    orchestrator: &Orchestrator<L>,
    ctx: &Ctx,
) -> anyhow::Result<()> {
    let session = orchestrator.session();
    let snapshot = orchestrator.snapshot().await?;
    let holdings = orchestrator.user_balances().await?;
    let coupon = orchestrator.coupon_state().await?;
    let countdown = describe_remaining(coupon.next_claim_time, unix_now());

    let payment = ctx.contracts.payment_token;
    let bond = ctx.contracts.bond_token;

    writeln!(stdout, "Account {}", session.account)?;
    writeln!(
        stdout,
        "   Payment token balance: {}",
        from_base_units(snapshot.payment_balance, payment.decimals, payment.decimals)
    )?;
    writeln!(
        stdout,
        "   Bond token balance:    {}",
        from_base_units(snapshot.bond_balance, bond.decimals, bond.decimals)
    )?;
    writeln!(
        stdout,
        "   Bond price:            ${}",
        format_usd_cents(snapshot.price_cents)
    )?;
    writeln!(
        stdout,
        "   Deposited / shares:    {} / {}",
        holdings.payment, holdings.shares
    )?;
    writeln!(stdout)?;
    writeln!(stdout, "Coupon")?;
    writeln!(
        stdout,
        "   Claimable: {}",
        from_base_units(coupon.claimable, payment.decimals, payment.decimals)
    )?;
    writeln!(stdout, "   Next claim: {}", countdown.label)?;
    writeln!(
        stdout,
        "   Claim open: {}",
        if coupon.can_claim { "yes" } else { "no" }
    )?;
    Ok(())
}
