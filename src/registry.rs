//! Device registry
//!
//! Process-wide, lazily built, read-only mapping from device name to a
//! long-lived device reference. The registry and the device singletons it
//! points at are built exactly once, on first access, inside `Lazy`
//! initializers; the `critical-section` implementation serializes that
//! construction, which on bare metal means the global interrupt line is
//! masked for the few insertions the build performs. After construction
//! the registry is immutable and safe for concurrent read.

use heapless::Vec;
use iflash_core::device::Flash;
use iflash_core::error::{Error, Result};
use once_cell::sync::Lazy;

#[cfg(feature = "sim")]
use iflash_core::device::FlashDevice;
#[cfg(feature = "sim")]
use iflash_sim::SimController;

/// Capacity of the device table.
const MAX_DEVICES: usize = 4;

/// Name the built-in internal flash registers under.
pub const INTERNAL_FLASH_NAME: &str = "internal-flash";

/// Read-only name-to-device table.
///
/// Entries are non-owning references; every device is owned by its own
/// static holder and lives for the whole process.
pub struct DeviceRegistry {
    devices: Vec<&'static dyn Flash, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Build the table of the platform's built-in devices.
    #[allow(unused_mut)]
    fn with_builtin_devices() -> Self {
        let mut registry = Self {
            devices: Vec::new(),
        };

        #[cfg(feature = "sim")]
        registry.register(internal_flash());

        registry
    }

    #[cfg_attr(not(feature = "sim"), allow(dead_code))]
    fn register(&mut self, device: &'static dyn Flash) {
        log::info!("registering flash device '{}'", device.name());
        if self.devices.push(device).is_err() {
            log::error!("device table full, dropping '{}'", device.name());
        }
    }

    /// Look up a device by name.
    pub fn get(&self, name: &str) -> Result<&'static dyn Flash> {
        self.devices
            .iter()
            .copied()
            .find(|device| device.name() == name)
            .ok_or(Error::DeviceNotFound)
    }

    /// All registered devices, in registration order. The order is not
    /// part of the contract.
    pub fn devices(&self) -> &[&'static dyn Flash] {
        &self.devices
    }
}

static REGISTRY: Lazy<DeviceRegistry> = Lazy::new(DeviceRegistry::with_builtin_devices);

/// Access the process-wide device registry, building it on first access.
pub fn registry() -> &'static DeviceRegistry {
    &REGISTRY
}

#[cfg(feature = "sim")]
static INTERNAL_FLASH: Lazy<FlashDevice<SimController>> =
    Lazy::new(|| FlashDevice::new(INTERNAL_FLASH_NAME, SimController::new()));

/// The built-in internal flash device, over the simulator backend.
#[cfg(feature = "sim")]
pub fn internal_flash() -> &'static FlashDevice<SimController> {
    &INTERNAL_FLASH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_the_internal_flash() {
        let device = registry().get("internal-flash").unwrap();
        assert_eq!(device.name(), "internal-flash");
        assert_eq!(device.bank_count(), 2);
        assert_eq!(device.min_programming_unit(), 32);
    }

    #[test]
    fn get_misses_with_device_not_found() {
        assert!(matches!(
            registry().get("missing-device"),
            Err(Error::DeviceNotFound)
        ));
    }

    #[test]
    fn enumeration_yields_the_builtin_device() {
        let devices = registry().devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name(), INTERNAL_FLASH_NAME);
    }

    #[test]
    fn erase_through_the_registry_handle() {
        let device = registry().get("internal-flash").unwrap();
        device.unlock().unwrap();
        device.erase_sector(0, 3).unwrap();
        device.lock().unwrap();
    }
}
