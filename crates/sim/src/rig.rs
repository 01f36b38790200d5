//! JSON description of a simulated rig.

use std::path::Path;

use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{PixelFormat, VideoConnection};
use serde::{Deserialize, Serialize};

/// A simulated rig: an ordered list of devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedRig {
    pub devices: Vec<SimulatedDeviceSpec>,
}

impl SimulatedRig {
    /// Load a rig description from a JSON file.
    pub fn from_file(path: &Path) -> RigscanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RigscanError::config(format!("{}: {e}", path.display())))
    }
}

/// Behaviour of one simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedDeviceSpec {
    pub name: String,

    /// Whether the display-name query succeeds.
    pub display_name_available: bool,

    /// Whether the capability-attributes interface can be obtained.
    pub attributes_available: bool,

    /// Whether the device exposes a video input interface.
    pub can_input: bool,

    /// Value of the input-format-detection flag.
    pub format_detection: bool,

    /// Whether the input-format-detection flag can be read.
    pub format_detection_readable: bool,

    /// Connectors the input can be switched to, in search order.
    pub connections: Vec<VideoConnection>,

    /// Connector selected when the monitor starts (first one if unset).
    pub initial_connection: Option<VideoConnection>,

    /// Connector a live source is plugged into, if any.
    pub live_connection: Option<VideoConnection>,

    /// Display mode reported while the signal is locked.
    pub detected_mode: String,

    /// Pixel format reported while the signal is locked.
    pub pixel_format: PixelFormat,

    /// Whether the device is one input of a multi-port card.
    pub sub_device: bool,

    /// Whether `stop()` waits for the worker thread to exit.
    pub quiesce_on_stop: bool,

    /// Delay between two simulated frames.
    pub frame_interval_ms: u64,
}

impl Default for SimulatedDeviceSpec {
    fn default() -> Self {
        Self {
            name: "Simulated Capture".to_string(),
            display_name_available: true,
            attributes_available: true,
            can_input: true,
            format_detection: true,
            format_detection_readable: true,
            connections: vec![VideoConnection::Sdi],
            initial_connection: None,
            live_connection: None,
            detected_mode: "1080i59.94".to_string(),
            pixel_format: PixelFormat::YUV_10BIT,
            sub_device: false,
            quiesce_on_stop: true,
            frame_interval_ms: 40,
        }
    }
}

impl SimulatedDeviceSpec {
    /// A capable device with the given name and defaults otherwise.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
