//! Hardware registry selection.

use rigscan_common::config::BackendConfig;
use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{DeviceHandle, HardwareRegistry};
use rigscan_sim::{SimulatedRegistry, SimulatedRig};

/// Registry for the vendor capture driver.
///
/// The driver is not linked into this build, so enumeration always reports
/// it as missing.
pub struct DriverRegistry;

impl HardwareRegistry for DriverRegistry {
    fn name(&self) -> &str {
        "driver"
    }

    fn enumerate(&mut self) -> RigscanResult<Vec<DeviceHandle>> {
        Err(RigscanError::driver_unavailable(
            "A capture-device iterator could not be created. \
             The capture drivers may not be installed.",
        ))
    }
}

/// Build the registry the config asks for.
pub fn get_registry(config: &BackendConfig) -> RigscanResult<Box<dyn HardwareRegistry>> {
    match config {
        BackendConfig::Driver => Ok(Box::new(DriverRegistry)),
        BackendConfig::Simulated { rig } => {
            tracing::debug!(rig = %rig.display(), "Using simulated rig");
            let rig = SimulatedRig::from_file(rig)?;
            Ok(Box::new(SimulatedRegistry::from_rig(rig)))
        }
    }
}
