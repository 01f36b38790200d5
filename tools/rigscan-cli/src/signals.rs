//! Termination signal listeners feeding the shutdown trigger.

use rigscan_prober::{ShutdownSignal, ShutdownTrigger};
use tokio::task::JoinHandle;

/// Listen for SIGINT, SIGTERM and SIGHUP until aborted. Every delivery is
/// forwarded; the trigger makes repeats harmless.
#[cfg(unix)]
pub fn install(trigger: ShutdownTrigger) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            let caught = tokio::select! {
                Some(()) = interrupt.recv() => ShutdownSignal::Interrupt,
                Some(()) = terminate.recv() => ShutdownSignal::Terminate,
                Some(()) = hangup.recv() => ShutdownSignal::Hangup,
                else => break,
            };
            trigger.trigger(caught);
        }
    }))
}

#[cfg(not(unix))]
pub fn install(trigger: ShutdownTrigger) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            trigger.trigger(ShutdownSignal::Interrupt);
        }
    }))
}
