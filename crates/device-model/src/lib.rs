//! Rigscan device model.
//!
//! Contracts for the capture-hardware layer that rigscan probes, without
//! coupling to a concrete vendor SDK. A backend implements
//! [`HardwareRegistry`] and [`CaptureDevice`]; everything the prober needs
//! from a device is reached through these traits.
//!
//! ```text
//! HardwareRegistry ──enumerate──▶ DeviceHandle (Arc<dyn CaptureDevice>)
//!                                    │
//!                 ┌──────────────────┼─────────────────────┐
//!                 ▼                  ▼                     ▼
//!      CapabilityAttributes   InputInterface        SignalMonitor
//!        (queried once)      (presence test)    (background worker)
//! ```

pub mod connection;
pub mod format;

use std::sync::Arc;

use rigscan_common::error::RigscanResult;

pub use connection::{ConnectionCycler, VideoConnection};
pub use format::{InputFrame, PixelFormat};

/// Shared, reference-counted handle to one capture device.
///
/// Cloning the handle retains the device; dropping a clone releases it.
pub type DeviceHandle = Arc<dyn CaptureDevice>;

/// Enumerates the capture devices present on this machine.
pub trait HardwareRegistry {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Collect every available device handle, in a stable order.
    fn enumerate(&mut self) -> RigscanResult<Vec<DeviceHandle>>;
}

/// One physical or logical capture device.
pub trait CaptureDevice: Send + Sync {
    /// Human-readable device name.
    fn display_name(&self) -> RigscanResult<String>;

    /// Query the capability-attributes interface.
    fn query_attributes(&self) -> RigscanResult<Box<dyn CapabilityAttributes>>;

    /// Acquire the input interface, if the device can capture at all.
    fn acquire_input(&self) -> Option<Box<dyn InputInterface>>;

    /// Create a (not yet started) signal monitor bound to this device.
    fn create_signal_monitor(&self) -> RigscanResult<Box<dyn SignalMonitor>>;
}

/// Discrete capability flags a device can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityFlag {
    /// The device can detect the format of an incoming signal by itself.
    SupportsInputFormatDetection,
}

/// Immutable capability attributes of a device.
pub trait CapabilityAttributes: Send + Sync {
    /// Read one capability flag.
    fn flag(&self, flag: CapabilityFlag) -> RigscanResult<bool>;
}

/// Video input interface of a device.
pub trait InputInterface: Send {
    /// Physical connectors this input can be switched to.
    fn supported_connections(&self) -> Vec<VideoConnection>;
}

/// Background subsystem observing a device's connectors for a live signal.
///
/// All methods take `&self`: implementations synchronize internally and
/// must tolerate reads while their worker updates state.
pub trait SignalMonitor: Send + Sync {
    /// Start the background worker. Called exactly once.
    fn start(&self) -> RigscanResult<()>;

    /// Stop the background worker. Called exactly once, after `start`.
    fn stop(&self) -> RigscanResult<()>;

    /// Whether a signal is currently locked on the active connector.
    fn signal_detected(&self) -> bool;

    /// Display mode of the locked signal (e.g. "1080i59.94").
    fn detected_mode(&self) -> String;

    /// Pixel format of the locked signal.
    fn pixel_format(&self) -> PixelFormat;

    /// Most recently captured frame, if any.
    fn last_frame(&self) -> Option<InputFrame>;

    /// Connector currently being probed.
    fn active_connection(&self) -> VideoConnection;

    /// Switch to the next candidate connector.
    fn select_next_connection(&self);

    /// Whether this device is one input of a multi-port card.
    fn is_sub_device(&self) -> bool;

    /// Drop the caller's reference. Returns the references still held
    /// elsewhere (e.g. by a worker that has not quiesced).
    fn release(self: Box<Self>) -> usize;
}
