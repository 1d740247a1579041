use std::io;

use anyhow::Context;
use memory_mountain::{run_mountain, KBestFitter, MountainConfig, TscClock};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config = MountainConfig::default();
    let stdout = io::stdout();

    run_mountain(&config, &TscClock::default(), KBestFitter::default(), stdout.lock())
        .context("memory mountain sweep failed")?;
    Ok(())
}
