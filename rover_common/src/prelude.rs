//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use rover_common::prelude::*;` and get
//! the most important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    CaptureConfig, CaptureDeviceKind, ConfigError, ConfigLoader, HardwareConfig, LogLevel,
    RoverConfig,
};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{GpioDriver, HalError};
pub use crate::hal::types::{Direction, PinLevel, PinMap};

// ─── Capture ────────────────────────────────────────────────────────
pub use crate::camera::{CaptureDevice, CaptureError, Frame, FrameFormat};

// ─── Limits ─────────────────────────────────────────────────────────
pub use crate::consts::{CENTER_ANGLE, MAX_ANGLE, MAX_DUTY_CYCLE, MIN_ANGLE};
