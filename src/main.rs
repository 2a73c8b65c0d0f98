//! `osdi-tap` binary

use clap::Parser;
use osdi_tap::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries Singer messages
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    Runner::new(Cli::parse()).run().await?;
    Ok(())
}
