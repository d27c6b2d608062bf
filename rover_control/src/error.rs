//! Top-level error type for the teleop binary.
//!
//! Only startup and loop-terminating failures live here. Hardware I/O
//! errors during the loop stay as `HalError` and are reported in place;
//! capture failures stay inside the worker; shutdown failures are
//! collected into a `ShutdownReport`.

use rover_common::camera::CaptureError;
use rover_common::config::ConfigError;
use rover_common::hal::driver::HalError;
use std::io;
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RoverError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// GPIO chip or pins could not be acquired
    #[error("GPIO unavailable: {0}")]
    GpioUnavailable(#[source] HalError),

    /// Camera could not be opened
    #[error("{0}")]
    CameraUnavailable(#[source] CaptureError),

    /// Capture worker could not be started
    #[error("{0}")]
    Worker(#[source] CaptureError),

    /// Signal handler installation failed
    #[error("Signal handler setup failed: {0}")]
    Signal(String),

    /// Reading operator input failed
    #[error("Keyboard input error: {0}")]
    Keyboard(#[source] io::Error),

    /// Writing operator output failed
    #[error("Console output error: {0}")]
    Console(#[source] io::Error),
}

impl RoverError {
    /// `true` for failures before the control loop started.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            RoverError::Config(_)
                | RoverError::GpioUnavailable(_)
                | RoverError::CameraUnavailable(_)
                | RoverError::Worker(_)
                | RoverError::Signal(_)
        )
    }
}
