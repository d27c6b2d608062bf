//! # Rover HAL Library
//!
//! Hardware abstraction for the rover: pluggable GPIO drivers, capture
//! devices and the actuator port that turns drive/steering commands into
//! pin writes.
//!
//! # Module Structure
//!
//! - [`actuator`] - `ActuatorPort`, drive truth table and servo mapping
//! - [`camera`] - Capture device implementations
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - GPIO driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    rover_hal                             │
//! │  ┌───────────────┐    ┌──────────────┐    ┌───────────┐  │
//! │  │ ActuatorPort  │───►│  GpioDriver  │◄───│ Registry  │  │
//! │  └───────────────┘    │ (trait obj)  │    └───────────┘  │
//! │                       └──────────────┘                   │
//! │  ┌───────────────┐                                       │
//! │  │ CaptureDevice │  command / simulation                 │
//! │  └───────────────┘                                       │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod actuator;
pub mod camera;
pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::actuator::{ActuatorPort, pulse_width_us};
pub use crate::camera::open_capture_device;
pub use crate::driver_registry::DriverRegistry;
