//! Rigscan prober
//!
//! The live core of rigscan: one [`DeviceProber`] per capture device, the
//! [`Rig`] that owns them in display order, and the [`StatusOrchestrator`]
//! loop that keeps searching each device's connectors for a signal while
//! repainting the status table.
//!
//! # Architecture
//!
//! ```text
//! HardwareRegistry ──▶ Rig ──────────────┬──▶ StatusOrchestrator ──▶ ConsoleRenderer
//!                      │ devices         │      (render, cycle,
//!                      │ probers ◀───────┘       wait/cancel)
//!                      │                 └──▶ StatusPublisher ──▶ status.json
//!                      ▼
//!            DeviceProber = handle + attributes + SignalMonitor?
//! ```

pub mod orchestrator;
pub mod prober;
pub mod render;
pub mod rig;
pub mod shutdown;
pub mod status;

pub use orchestrator::StatusOrchestrator;
pub use prober::{DeviceProber, ProberHandle, ReleaseOutcome};
pub use render::{ConsoleRenderer, StatusRenderer};
pub use rig::Rig;
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use status::{StatusPublisher, StatusRow, StatusSnapshot};
