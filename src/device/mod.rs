//! Device catalog queries

use crate::driver::{AudioDriver, DeviceInfo};
use crate::error::Result;

/// Borrowed pass-through view over the driver's device table.
///
/// No state of its own; exists to give applications the query surface
/// without handing out the driver itself.
pub struct DeviceCatalog<'a, D: AudioDriver> {
    driver: &'a D,
}

impl<'a, D: AudioDriver> DeviceCatalog<'a, D> {
    /// Borrow a driver's device table
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Number of devices present
    pub fn count(&self) -> u32 {
        self.driver.device_count()
    }

    /// Index of the default output device
    pub fn default_output(&self) -> u32 {
        self.driver.default_output_device()
    }

    /// Index of the default input device
    pub fn default_input(&self) -> u32 {
        self.driver.default_input_device()
    }

    /// Capability record for one device
    pub fn info(&self, device_id: u32) -> Result<DeviceInfo> {
        self.driver.device_info(device_id)
    }

    /// Enumerate every device that yields a capability record
    pub fn all(&self) -> Vec<(u32, DeviceInfo)> {
        (0..self.count())
            .filter_map(|id| self.info(id).ok().map(|info| (id, info)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DummyDriver;

    #[test]
    fn test_catalog_passes_through() {
        let driver = DummyDriver::new();
        let catalog = DeviceCatalog::new(&driver);

        assert_eq!(catalog.count(), 3);
        assert_eq!(catalog.default_output(), 0);
        assert_eq!(catalog.default_input(), 1);
        assert_eq!(catalog.info(0).unwrap().name, "Dummy Output");
        assert!(catalog.info(3).is_err());
        assert_eq!(catalog.all().len(), 3);
    }
}
