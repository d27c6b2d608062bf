//! # Rover Control Library
//!
//! Keyboard teleoperation for a two-actuator rover (H-bridge drive motor
//! plus steering servo) with periodic still capture running alongside.
//!
//! ## Threads
//!
//! - **Foreground**: [`control::ControlLoop`] reads one key at a time and
//!   drives the [`rover_hal::ActuatorPort`].
//! - **Capture**: [`capture::CaptureWorker`] grabs a frame every period
//!   and writes it to a timestamp-named file.
//!
//! The two share only the [`lifecycle::LifecycleFlag`]. At exit the
//! [`shutdown::ShutdownSequencer`] stops the flag, joins the worker and
//! releases the hardware in a fixed order.

pub mod capture;
pub mod command;
pub mod control;
pub mod error;
pub mod keyboard;
pub mod lifecycle;
pub mod session;
pub mod shutdown;
pub mod state;

pub use crate::command::Command;
pub use crate::control::{ControlLoop, LoopExit};
pub use crate::error::RoverError;
pub use crate::lifecycle::LifecycleFlag;
pub use crate::session::Session;
pub use crate::shutdown::{ShutdownReport, ShutdownSequencer, ShutdownStep};
