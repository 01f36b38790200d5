//! The probed rig: enumerated hardware handles plus one prober per device.
//!
//! Acquisition runs devices first, probers second. Teardown mirrors it in
//! reverse and also runs from `Drop`, so a faulted run still releases
//! everything.

use std::sync::Arc;

use rigscan_common::config::ProbePolicy;
use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{DeviceHandle, HardwareRegistry};

use crate::prober::{ProberHandle, ReleaseOutcome};

/// Ordered device registry. Indices are stable for the rig's lifetime and
/// define the display order.
pub struct Rig {
    probers: Vec<ProberHandle>,
    devices: Vec<DeviceHandle>,
}

impl Rig {
    /// Enumerate `registry` and build a prober for every device.
    pub fn open(registry: &mut dyn HardwareRegistry, policy: ProbePolicy) -> RigscanResult<Self> {
        tracing::debug!(backend = registry.name(), "Collecting capture devices");
        let devices = registry.enumerate()?;
        tracing::debug!(count = devices.len(), "Found devices");
        if devices.is_empty() {
            return Err(RigscanError::NoDevices);
        }

        tracing::debug!("Creating device probers");
        let mut probers = Vec::with_capacity(devices.len());
        let mut kept = Vec::with_capacity(devices.len());
        for (index, device) in devices.into_iter().enumerate() {
            tracing::debug!(index, "Creating device prober");
            match ProberHandle::probe(Arc::clone(&device)) {
                Ok(prober) => {
                    probers.push(prober);
                    kept.push(device);
                }
                Err(e) if policy == ProbePolicy::Skip => {
                    tracing::warn!(index, error = %e, "Skipping device that failed probing");
                }
                Err(e) => {
                    // Release what was built so far in the usual order.
                    let partial = Rig {
                        probers,
                        devices: kept,
                    };
                    drop(partial);
                    return Err(e);
                }
            }
        }

        if probers.is_empty() {
            return Err(RigscanError::NoDevices);
        }
        Ok(Self {
            probers,
            devices: kept,
        })
    }

    /// Probers in display order.
    pub fn probers(&self) -> &[ProberHandle] {
        &self.probers
    }

    /// Hardware handles, index-aligned with [`probers`](Self::probers).
    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.probers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probers.is_empty()
    }

    /// Release probers, then hardware handles, reporting anything that is
    /// still referenced elsewhere.
    pub fn close(mut self) -> RigscanResult<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> RigscanResult<()> {
        let mut first_error: Option<RigscanError> = None;

        if !self.probers.is_empty() {
            tracing::debug!("Freeing device probers");
        }
        for (index, prober) in std::mem::take(&mut self.probers).into_iter().enumerate() {
            tracing::debug!(index, "Freeing device prober");
            match prober.release() {
                Ok(ReleaseOutcome::TornDown) => {}
                Ok(ReleaseOutcome::Shared { remaining }) => {
                    first_error.get_or_insert(RigscanError::OutstandingReferences {
                        what: "device prober",
                        index,
                        remaining,
                    });
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if !self.devices.is_empty() {
            tracing::debug!("Freeing capture devices");
        }
        for (index, device) in std::mem::take(&mut self.devices).into_iter().enumerate() {
            tracing::debug!(index, "Freeing capture device");
            let remaining = Arc::strong_count(&device) - 1;
            if remaining != 0 {
                first_error.get_or_insert(RigscanError::OutstandingReferences {
                    what: "capture device",
                    index,
                    remaining,
                });
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::error!(error = %e, "Rig teardown failed");
        }
    }
}
