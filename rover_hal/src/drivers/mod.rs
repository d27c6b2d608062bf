//! GPIO driver implementations.
//!
//! - [`simulation`] - In-memory driver for development and testing
//! - [`sysfs`] - Linux `/sys/class/gpio` + `/sys/class/pwm` driver
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `GpioDriver` trait from `rover_common::hal::driver`
//! 3. Register the driver in [`register_all_drivers`]

pub mod simulation;
pub mod sysfs;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);
    registry.register("sysfs", sysfs::create_driver);
}
