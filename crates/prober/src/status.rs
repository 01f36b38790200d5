//! Status rows and snapshots built from device probers.

use std::path::Path;
use std::time::Duration;

use rigscan_common::error::RigscanResult;
use rigscan_device_model::{PixelFormat, VideoConnection};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::prober::ProberHandle;

/// Name prefix marking one input of a multi-port card.
pub const SUB_DEVICE_PREFIX: &str = "\\-> ";

/// One device's line in the status table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    /// Position in the device registry.
    pub index: usize,
    /// Display name, prefixed for sub-devices.
    pub name: String,
    pub can_input_and_detect: bool,
    pub signal_detected: bool,
    pub active_connection: VideoConnection,
    pub detected_mode: String,
    pub pixel_format: PixelFormat,
    /// Rendered greyed out (no signal).
    pub dimmed: bool,
}

impl StatusRow {
    /// Read the current status of one prober.
    pub fn collect(index: usize, prober: &ProberHandle) -> RigscanResult<Self> {
        let mut name = prober.device_name()?;
        if prober.is_sub_device() {
            name.insert_str(0, SUB_DEVICE_PREFIX);
        }
        let signal_detected = prober.signal_detected();

        Ok(Self {
            index,
            name,
            can_input_and_detect: prober.can_autodetect() && prober.can_input(),
            signal_detected,
            active_connection: prober.active_connection(),
            detected_mode: prober.detected_mode(),
            pixel_format: prober.pixel_format(),
            dimmed: !signal_detected,
        })
    }

    /// Rows for every prober, in registry order.
    pub fn collect_all(probers: &[ProberHandle]) -> RigscanResult<Vec<Self>> {
        probers
            .iter()
            .enumerate()
            .map(|(index, prober)| Self::collect(index, prober))
            .collect()
    }
}

/// Point-in-time status of the whole rig.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// RFC 3339 capture time.
    pub captured_at: String,
    pub devices: Vec<StatusRow>,
}

impl StatusSnapshot {
    pub fn capture(probers: &[ProberHandle]) -> RigscanResult<Self> {
        Ok(Self {
            captured_at: chrono::Utc::now().to_rfc3339(),
            devices: StatusRow::collect_all(probers)?,
        })
    }
}

/// Exports status snapshots for consumers outside the console.
///
/// Holds its own reference to every prober, so it can outlive the status
/// loop; dropping it releases those references.
pub struct StatusPublisher {
    probers: Vec<ProberHandle>,
}

impl StatusPublisher {
    pub fn new(probers: &[ProberHandle]) -> Self {
        Self {
            probers: probers.to_vec(),
        }
    }

    pub fn snapshot(&self) -> RigscanResult<StatusSnapshot> {
        StatusSnapshot::capture(&self.probers)
    }

    /// Write the current snapshot as JSON, replacing `path` atomically.
    pub fn write_to(&self, path: &Path) -> RigscanResult<()> {
        let json = serde_json::to_string_pretty(&self.snapshot()?)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Export a snapshot every `interval` until `cancel` fires.
    pub async fn run(
        &self,
        path: &Path,
        interval: Duration,
        cancel: CancellationToken,
    ) -> RigscanResult<u64> {
        let mut written = 0u64;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.write_to(path)?;
                    written += 1;
                }
            }
        }
        tracing::debug!(written, path = %path.display(), "Status publisher stopped");
        Ok(written)
    }
}
