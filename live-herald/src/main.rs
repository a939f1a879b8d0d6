use anyhow::Context;
use live_herald::config::HeraldConfig;
use live_herald::{Herald, logging, panic_hook, signals};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = HeraldConfig::from_env().context("invalid configuration")?;

    let _log_guard = logging::init_logging(&config.log_dir)?;
    panic_hook::install();
    let cleanup = logging::start_retention_cleanup(config.log_dir.clone());

    info!(version = env!("CARGO_PKG_VERSION"), "live-herald starting");

    let herald = Herald::from_config(&config)?;
    match herald.subscribers().await {
        Ok(ids) => info!(count = ids.len(), "Loaded subscribers"),
        Err(e) => error!(error = %e, "Subscriber store unreadable at startup"),
    }

    let watcher = tokio::spawn(herald.watcher().run());

    let signal = signals::wait_for_shutdown_signal().await?;
    info!(signal, "Shutdown signal received, stopping");

    watcher.abort();
    cleanup.abort();

    Ok(())
}
