//! Challenge host: runs the engine with the built-in catalog until Ctrl-C.

use std::process;
use std::sync::Arc;

use chl_core::SystemClock;
use chl_host::{EngineService, FileStore, HostConfig, HostResult, TickScheduler, init_logging};
use chl_rules::{ChallengeEngine, ShutdownReason, default_catalog};

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "challenge host failed");
        process::exit(1);
    }
}

async fn run() -> HostResult<()> {
    let config = HostConfig::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        seed = config.rules.seed,
        resume_on_load = config.rules.resume_on_load,
        tick = ?config.tick_interval,
        "starting challenge host"
    );

    let store = FileStore::open(&config.data_dir)?;
    let engine = ChallengeEngine::with_catalog(config.rules.clone(), Arc::new(SystemClock), default_catalog())?;
    let (handle, task) = EngineService::spawn(engine, Arc::new(store), config.queue_capacity);

    handle.restore().await?;
    let ticker = handle.start_ticking(&TickScheduler::current(), config.tick_interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c; shutting down");
    }

    ticker.cancel();
    handle.shutdown(ShutdownReason::Normal).await?;
    task.await?;
    Ok(())
}
