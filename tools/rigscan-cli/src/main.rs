//! Rigscan CLI: live signal status for every port of a capture rig.
//!
//! Usage:
//!   rigscan    Monitor every capture device until SIGINT, SIGTERM or SIGHUP
//!
//! There are no flags. Settings come from `$XDG_CONFIG_HOME/rigscan/config.json`
//! when that file exists.

use rigscan_common::config::AppConfig;
use rigscan_common::error::RigscanResult;
use rigscan_prober::{ConsoleRenderer, Rig, ShutdownTrigger, StatusOrchestrator};
use tokio_util::sync::CancellationToken;

mod backend;
mod export;
mod signals;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();
    rigscan_common::logging::init_logging(&config.logging);

    let mut registry = backend::get_registry(&config.backend)?;
    let rig = Rig::open(registry.as_mut(), config.probe_policy)?;
    tracing::info!(devices = rig.len(), backend = registry.name(), "Rig opened");

    let trigger = ShutdownTrigger::new(CancellationToken::new());
    // Listeners first: nothing else holds prober references yet if this fails.
    let listener = signals::install(trigger.clone())?;

    let exporter = config.status_file.clone().map(|path| {
        export::Exporter::spawn(rig.probers(), path, config.poll_interval(), trigger.token())
    });

    let mut orchestrator = StatusOrchestrator::new(
        rig.probers().to_vec(),
        ConsoleRenderer::stdout(),
        config.poll_interval(),
        trigger.token(),
    );
    let outcome = orchestrator.run().await;
    drop(orchestrator);

    listener.abort();
    if let Some(exporter) = exporter {
        exporter.stop().await;
    }

    let iterations = settle(outcome, rig.close())?;
    tracing::debug!(iterations, "Shut down cleanly");

    println!("Bye.");
    Ok(())
}

/// Combine the loop result with the rig teardown result. A loop failure is
/// the one reported; a teardown failure behind it is logged.
fn settle(outcome: RigscanResult<u64>, closed: RigscanResult<()>) -> RigscanResult<u64> {
    match (outcome, closed) {
        (Ok(iterations), Ok(())) => Ok(iterations),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::error!(error = %close_err, "Rig teardown failed");
            }
            Err(e)
        }
    }
}
