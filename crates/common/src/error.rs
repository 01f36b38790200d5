//! Error types shared across rigscan crates.

/// Top-level error type for rigscan operations.
#[derive(Debug, thiserror::Error)]
pub enum RigscanError {
    #[error("Driver unavailable: {message}")]
    DriverUnavailable { message: String },

    #[error("No capture devices found")]
    NoDevices,

    #[error("Capability query failed for {device}: {message}")]
    CapabilityQuery { device: String, message: String },

    #[error("Failed to get the display name for the capture device: {message}")]
    DisplayName { message: String },

    #[error("Signal monitor error: {message}")]
    Monitor { message: String },

    #[error("Signal monitor for {device} did not quiesce: {remaining} reference(s) outstanding after stop")]
    MonitorNotQuiescent { device: String, remaining: usize },

    #[error("{what} #{index} still has {remaining} outstanding reference(s)")]
    OutstandingReferences {
        what: &'static str,
        index: usize,
        remaining: usize,
    },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using RigscanError.
pub type RigscanResult<T> = Result<T, RigscanError>;

impl RigscanError {
    pub fn driver_unavailable(msg: impl Into<String>) -> Self {
        Self::DriverUnavailable {
            message: msg.into(),
        }
    }

    pub fn capability(device: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CapabilityQuery {
            device: device.into(),
            message: msg.into(),
        }
    }

    pub fn display_name(msg: impl Into<String>) -> Self {
        Self::DisplayName {
            message: msg.into(),
        }
    }

    pub fn monitor(msg: impl Into<String>) -> Self {
        Self::Monitor {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
