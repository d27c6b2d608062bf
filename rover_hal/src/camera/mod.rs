//! Capture device implementations.
//!
//! - [`command`] - Still-capture program writing JPEG to stdout (`rpicam-still`)
//! - [`simulation`] - Generated test pattern
//!
//! [`open_capture_device`] picks the backend named in `[capture].device`.

pub mod command;
pub mod simulation;

use rover_common::camera::{CaptureDevice, CaptureError};
use rover_common::config::{CaptureConfig, CaptureDeviceKind};
use tracing::info;

pub use command::CommandCamera;
pub use simulation::TestPatternCamera;

/// Open the configured capture device.
///
/// # Errors
/// Returns `CaptureError::Unavailable` if the camera cannot be opened.
pub fn open_capture_device(config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    let device: Box<dyn CaptureDevice> = match config.device {
        CaptureDeviceKind::Command => Box::new(CommandCamera::open(config)?),
        CaptureDeviceKind::Simulation => Box::new(TestPatternCamera::new(320, 240)),
    };
    info!("Camera opened: {}", device.name());
    Ok(device)
}
