//! Hardware abstraction layer types.
//!
//! This module contains the GPIO driver capability trait and the
//! pin-level types shared between drivers and the actuator port.

pub mod driver;
pub mod types;
