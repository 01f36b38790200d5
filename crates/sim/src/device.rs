//! Simulated capture device and its capability interfaces.

use std::time::Duration;

use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{
    CapabilityAttributes, CapabilityFlag, CaptureDevice, ConnectionCycler, InputInterface,
    SignalMonitor, VideoConnection,
};

use crate::monitor::SimulatedSignalMonitor;
use crate::rig::SimulatedDeviceSpec;
use crate::signal::SignalControl;

/// A capture device whose behaviour comes from a [`SimulatedDeviceSpec`].
pub struct SimulatedDevice {
    spec: SimulatedDeviceSpec,
    signal: SignalControl,
}

impl SimulatedDevice {
    pub fn new(spec: SimulatedDeviceSpec) -> Self {
        let signal = SignalControl::new(
            spec.live_connection,
            spec.detected_mode.clone(),
            spec.pixel_format,
        );
        Self::with_signal(spec, signal)
    }

    /// Build a device wired to an existing signal control.
    pub fn with_signal(spec: SimulatedDeviceSpec, signal: SignalControl) -> Self {
        Self { spec, signal }
    }

    pub fn spec(&self) -> &SimulatedDeviceSpec {
        &self.spec
    }

    /// Control over the source plugged into this device.
    pub fn signal_control(&self) -> SignalControl {
        self.signal.clone()
    }
}

impl CaptureDevice for SimulatedDevice {
    fn display_name(&self) -> RigscanResult<String> {
        if !self.spec.display_name_available {
            return Err(RigscanError::display_name(format!(
                "display name of simulated device {:?} is unavailable",
                self.spec.name
            )));
        }
        Ok(self.spec.name.clone())
    }

    fn query_attributes(&self) -> RigscanResult<Box<dyn CapabilityAttributes>> {
        if !self.spec.attributes_available {
            return Err(RigscanError::capability(
                &self.spec.name,
                "could not obtain the capability attributes interface",
            ));
        }
        Ok(Box::new(SimulatedAttributes {
            device: self.spec.name.clone(),
            format_detection: self
                .spec
                .format_detection_readable
                .then_some(self.spec.format_detection),
        }))
    }

    fn acquire_input(&self) -> Option<Box<dyn InputInterface>> {
        if !self.spec.can_input {
            return None;
        }
        Some(Box::new(SimulatedInput {
            connections: self.spec.connections.clone(),
        }))
    }

    fn create_signal_monitor(&self) -> RigscanResult<Box<dyn SignalMonitor>> {
        let initial = self
            .spec
            .initial_connection
            .unwrap_or(VideoConnection::Unspecified);
        let cycler = ConnectionCycler::starting_at(self.spec.connections.iter().copied(), initial);
        Ok(Box::new(SimulatedSignalMonitor::new(
            self.spec.name.clone(),
            cycler,
            self.signal.clone(),
            self.spec.sub_device,
            self.spec.quiesce_on_stop,
            Duration::from_millis(self.spec.frame_interval_ms.max(1)),
        )))
    }
}

struct SimulatedAttributes {
    device: String,
    format_detection: Option<bool>,
}

impl CapabilityAttributes for SimulatedAttributes {
    fn flag(&self, flag: CapabilityFlag) -> RigscanResult<bool> {
        match flag {
            CapabilityFlag::SupportsInputFormatDetection => {
                self.format_detection.ok_or_else(|| {
                    RigscanError::capability(&self.device, "failed to query auto-detection flag")
                })
            }
        }
    }
}

struct SimulatedInput {
    connections: Vec<VideoConnection>,
}

impl InputInterface for SimulatedInput {
    fn supported_connections(&self) -> Vec<VideoConnection> {
        self.connections.clone()
    }
}
