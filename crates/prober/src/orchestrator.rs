//! The poll → cycle connections → render loop.

use std::time::Duration;

use rigscan_common::error::RigscanResult;
use tokio_util::sync::CancellationToken;

use crate::prober::ProberHandle;
use crate::render::StatusRenderer;
use crate::status::StatusRow;

/// Drives every prober once per interval until cancelled.
///
/// Each iteration renders the current status, then moves every device
/// without a signal on to its next connector. The cancellation token is
/// checked at the top of each iteration and also wakes the wait between
/// iterations.
pub struct StatusOrchestrator<R: StatusRenderer> {
    probers: Vec<ProberHandle>,
    renderer: R,
    interval: Duration,
    cancel: CancellationToken,
    iteration: u64,
}

impl<R: StatusRenderer> StatusOrchestrator<R> {
    pub fn new(
        probers: Vec<ProberHandle>,
        renderer: R,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            probers,
            renderer,
            interval,
            cancel,
            iteration: 0,
        }
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// One iteration without the wait: render, then cycle connections.
    pub fn tick(&mut self) -> RigscanResult<()> {
        let rows = StatusRow::collect_all(&self.probers)?;
        self.renderer.render(&rows, self.iteration)?;

        for prober in &self.probers {
            if !prober.signal_detected() {
                prober.select_next_connection();
            }
        }

        self.iteration += 1;
        Ok(())
    }

    /// Loop until cancelled. Returns the number of iterations run.
    pub async fn run(&mut self) -> RigscanResult<u64> {
        tracing::debug!(
            devices = self.probers.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Entering display loop"
        );
        while !self.cancel.is_cancelled() {
            self.tick()?;

            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::debug!(iterations = self.iteration, "Display loop finished");
        Ok(self.iteration)
    }

    /// Hand back the renderer, releasing this loop's prober references.
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
