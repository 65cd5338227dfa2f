use clap::Parser;

use bondfi::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = cli.env.into_ctx()?;

    bondfi::telemetry::init(ctx.log_level.into())?;

    bondfi::cli::run(ctx, cli.command).await
}
