//! Runtime control over the source plugged into a simulated device.

use std::sync::{Arc, Mutex, MutexGuard};

use rigscan_device_model::{PixelFormat, VideoConnection};

#[derive(Debug)]
struct LiveSignal {
    connection: Option<VideoConnection>,
    mode: String,
    pixel_format: PixelFormat,
}

/// Shared handle to the simulated "cable": which connector carries a
/// signal, and what that signal looks like.
///
/// Holding a `SignalControl` does not retain the device it belongs to.
#[derive(Debug, Clone)]
pub struct SignalControl {
    inner: Arc<Mutex<LiveSignal>>,
}

impl SignalControl {
    pub fn new(
        connection: Option<VideoConnection>,
        mode: impl Into<String>,
        pixel_format: PixelFormat,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LiveSignal {
                connection,
                mode: mode.into(),
                pixel_format,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LiveSignal> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Plug a source into `connection`.
    pub fn plug(&self, connection: VideoConnection) {
        self.state().connection = Some(connection);
    }

    /// Unplug the source.
    pub fn unplug(&self) {
        self.state().connection = None;
    }

    /// Change the signal the source sends.
    pub fn set_format(&self, mode: impl Into<String>, pixel_format: PixelFormat) {
        let mut state = self.state();
        state.mode = mode.into();
        state.pixel_format = pixel_format;
    }

    pub fn live_connection(&self) -> Option<VideoConnection> {
        self.state().connection
    }

    pub fn detected_mode(&self) -> String {
        self.state().mode.clone()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.state().pixel_format
    }
}
