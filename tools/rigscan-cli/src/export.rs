//! Background status-file export.

use std::path::PathBuf;
use std::time::Duration;

use rigscan_prober::{ProberHandle, StatusPublisher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Running export task. Holds prober references until [`stop`](Self::stop)
/// returns.
pub struct Exporter {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Exporter {
    pub fn spawn(
        probers: &[ProberHandle],
        path: PathBuf,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let publisher = StatusPublisher::new(probers);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            match publisher.run(&path, interval, task_cancel).await {
                Ok(written) => tracing::debug!(written, "Status export stopped"),
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "Status export failed")
                }
            }
        });
        Self { task, cancel }
    }

    /// Cancel the export and wait until its prober references are released.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Status export task ended abnormally");
        }
    }
}
