//! GPIO driver trait and error types.
//!
//! This module defines:
//! - `GpioDriver` trait - Interface for pluggable GPIO/PWM backends
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type

use crate::config::HardwareConfig;
use crate::hal::types::PinLevel;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Chip could not be opened or a pin could not be claimed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Hardware write failed
    #[error("Hardware I/O error: {0}")]
    Io(String),

    /// Command argument outside the accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation on a chip that is not open (or already closed)
    #[error("GPIO chip not open")]
    NotOpen,

    /// Operation on a pin that was never claimed
    #[error("Pin {0} not claimed")]
    PinNotClaimed(u32),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&HardwareConfig) -> Box<dyn GpioDriver>;

/// Trait defining the interface for GPIO drivers.
///
/// The actuator port drives the H-bridge and the steering servo through
/// this trait, enabling pluggable backends (simulation, sysfs, ...).
///
/// # Lifecycle
///
/// 1. `open()` - Called once at startup
/// 2. `claim_output()` - Called once per actuator pin
/// 3. `write()` / `pwm()` / `servo_pulse()` - Called per operator command
/// 4. `close()` - Called exactly once at shutdown
///
/// After `close()` every other call returns `HalError::NotOpen`.
pub trait GpioDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation", "sysfs").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Open GPIO chip `chip`.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the chip is unavailable.
    fn open(&mut self, chip: u32) -> Result<(), HalError>;

    /// Claim `pin` as an output, initially low.
    fn claim_output(&mut self, pin: u32) -> Result<(), HalError>;

    /// Drive a claimed output to `level`.
    fn write(&mut self, pin: u32, level: PinLevel) -> Result<(), HalError>;

    /// Start a PWM signal on `pin` at `frequency_hz` with `duty_cycle` percent.
    ///
    /// A duty cycle of 0 holds the line low.
    fn pwm(&mut self, pin: u32, frequency_hz: u32, duty_cycle: u8) -> Result<(), HalError>;

    /// Emit 50 Hz servo pulses of `width_us` microseconds on `pin`.
    ///
    /// A width of 0 stops the pulses.
    fn servo_pulse(&mut self, pin: u32, width_us: u32) -> Result<(), HalError>;

    /// Release all claimed pins and close the chip.
    fn close(&mut self) -> Result<(), HalError>;
}
