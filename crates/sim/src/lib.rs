//! Rigscan simulated hardware backend.
//!
//! Implements every capture-hardware contract from `rigscan-device-model`
//! in memory, so the prober and the status loop can run on machines without
//! capture cards and be exercised from tests. A rig is described as JSON:
//!
//! ```json
//! {"devices": [
//!   {"name": "DeckLink Duo (1)", "connections": ["sdi"], "live_connection": "sdi"},
//!   {"name": "DeckLink Duo (2)", "sub_device": true, "connections": ["sdi"]},
//!   {"name": "Intensity Pro 4K", "connections": ["hdmi", "component", "composite"],
//!    "live_connection": "component", "detected_mode": "720p50"}
//! ]}
//! ```

pub mod device;
pub mod monitor;
pub mod rig;
pub mod signal;

use std::sync::Arc;

use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{DeviceHandle, HardwareRegistry};

pub use device::SimulatedDevice;
pub use monitor::SimulatedSignalMonitor;
pub use rig::{SimulatedDeviceSpec, SimulatedRig};
pub use signal::SignalControl;

/// Registry handing out one [`SimulatedDevice`] per device of a rig.
pub struct SimulatedRegistry {
    devices: Option<Vec<(SimulatedDeviceSpec, SignalControl)>>,
}

impl SimulatedRegistry {
    /// Registry for the given rig.
    pub fn from_rig(rig: SimulatedRig) -> Self {
        Self::from_specs(rig.devices)
    }

    /// Registry for the given device specs, in order.
    pub fn from_specs(specs: Vec<SimulatedDeviceSpec>) -> Self {
        let devices = specs
            .into_iter()
            .map(|spec| {
                let signal = SignalControl::new(
                    spec.live_connection,
                    spec.detected_mode.clone(),
                    spec.pixel_format,
                );
                (spec, signal)
            })
            .collect();
        Self {
            devices: Some(devices),
        }
    }

    /// Registry whose driver is missing: enumeration fails.
    pub fn unavailable() -> Self {
        Self { devices: None }
    }

    /// Signal control of the device at `index`, valid before and after
    /// enumeration.
    pub fn signal_control(&self, index: usize) -> Option<SignalControl> {
        self.devices
            .as_ref()?
            .get(index)
            .map(|(_, signal)| signal.clone())
    }
}

impl HardwareRegistry for SimulatedRegistry {
    fn name(&self) -> &str {
        "simulated"
    }

    fn enumerate(&mut self) -> RigscanResult<Vec<DeviceHandle>> {
        let devices = self.devices.as_ref().ok_or_else(|| {
            RigscanError::driver_unavailable(
                "A capture-device iterator could not be created. \
                 The capture drivers may not be installed.",
            )
        })?;

        let handles: Vec<DeviceHandle> = devices
            .iter()
            .map(|(spec, signal)| {
                Arc::new(SimulatedDevice::with_signal(spec.clone(), signal.clone()))
                    as DeviceHandle
            })
            .collect();
        tracing::debug!(count = handles.len(), "Enumerated simulated devices");
        Ok(handles)
    }
}
