//! Simulated signal monitor with a background frame worker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{
    ConnectionCycler, InputFrame, PixelFormat, SignalMonitor, VideoConnection,
};

use crate::signal::SignalControl;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared between the monitor and its worker thread.
struct MonitorShared {
    device: String,
    cycler: Mutex<ConnectionCycler>,
    signal: SignalControl,
    running: AtomicBool,
    sequence: AtomicU64,
    last_frame: Mutex<Option<InputFrame>>,
}

impl MonitorShared {
    fn locked(&self) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        let current = lock(&self.cycler).current();
        current != VideoConnection::Unspecified && self.signal.live_connection() == Some(current)
    }
}

/// Simulated monitor: locks onto the signal when its active connector
/// matches the connector the [`SignalControl`] has a source plugged into.
pub struct SimulatedSignalMonitor {
    shared: Arc<MonitorShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    sub_device: bool,
    quiesce_on_stop: bool,
    frame_interval: Duration,
}

impl SimulatedSignalMonitor {
    pub fn new(
        device: impl Into<String>,
        cycler: ConnectionCycler,
        signal: SignalControl,
        sub_device: bool,
        quiesce_on_stop: bool,
        frame_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                device: device.into(),
                cycler: Mutex::new(cycler),
                signal,
                running: AtomicBool::new(false),
                sequence: AtomicU64::new(0),
                last_frame: Mutex::new(None),
            }),
            worker: Mutex::new(None),
            sub_device,
            quiesce_on_stop,
            frame_interval,
        }
    }

    /// Whether the worker thread is still alive.
    pub fn worker_alive(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn run_worker(shared: Arc<MonitorShared>, interval: Duration) {
        tracing::debug!(device = %shared.device, "Signal monitor worker started");
        while shared.running.load(Ordering::Acquire) {
            if shared.locked() {
                let (width, height) = frame_geometry(&shared.signal.detected_mode());
                let sequence = shared.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                *lock(&shared.last_frame) = Some(InputFrame {
                    sequence,
                    width,
                    height,
                    row_bytes: width * 2,
                });
            }
            std::thread::sleep(interval);
        }
        tracing::debug!(device = %shared.device, "Signal monitor worker stopped");
    }
}

impl SignalMonitor for SimulatedSignalMonitor {
    fn start(&self) -> RigscanResult<()> {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return Err(RigscanError::monitor(format!(
                "monitor for {} already started",
                self.shared.device
            )));
        }
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let interval = self.frame_interval;
        let handle = std::thread::Builder::new()
            .name(format!("signal-monitor:{}", self.shared.device))
            .spawn(move || Self::run_worker(shared, interval))?;
        *worker = Some(handle);
        Ok(())
    }

    fn stop(&self) -> RigscanResult<()> {
        if !self.quiesce_on_stop {
            // Models a monitor whose worker outlives stop().
            tracing::debug!(device = %self.shared.device, "Leaving signal monitor worker running");
            return Ok(());
        }
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = lock(&self.worker).take() {
            handle
                .join()
                .map_err(|_| RigscanError::monitor("signal monitor worker panicked"))?;
        }
        Ok(())
    }

    fn signal_detected(&self) -> bool {
        self.shared.locked()
    }

    fn detected_mode(&self) -> String {
        self.shared.signal.detected_mode()
    }

    fn pixel_format(&self) -> PixelFormat {
        self.shared.signal.pixel_format()
    }

    fn last_frame(&self) -> Option<InputFrame> {
        if !self.shared.locked() {
            return None;
        }
        *lock(&self.shared.last_frame)
    }

    fn active_connection(&self) -> VideoConnection {
        lock(&self.shared.cycler).current()
    }

    fn select_next_connection(&self) {
        let next = lock(&self.shared.cycler).advance();
        *lock(&self.shared.last_frame) = None;
        tracing::debug!(device = %self.shared.device, connection = %next, "Switched input connection");
    }

    fn is_sub_device(&self) -> bool {
        self.sub_device
    }

    fn release(self: Box<Self>) -> usize {
        let remaining = Arc::strong_count(&self.shared) - 1;
        drop(self);
        remaining
    }
}

impl Drop for SimulatedSignalMonitor {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if self.quiesce_on_stop {
            if let Some(handle) = lock(&self.worker).take() {
                let _ = handle.join();
            }
        }
    }
}

/// Frame size for a display mode name like "1080i59.94" or "720p50".
fn frame_geometry(mode: &str) -> (u32, u32) {
    let lines: String = mode.chars().take_while(|c| c.is_ascii_digit()).collect();
    match lines.as_str() {
        "486" => (720, 486),
        "576" => (720, 576),
        "720" => (1280, 720),
        "2160" => (3840, 2160),
        "4320" => (7680, 4320),
        _ => (1920, 1080),
    }
}
