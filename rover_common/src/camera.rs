//! Capture device trait and frame types.
//!
//! A capture device is opened by its constructor (startup fails if the
//! camera is unavailable), yields one still frame per `read_frame()` call
//! and is released exactly once at shutdown.

use thiserror::Error;

/// Error types for capture devices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Camera could not be opened
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    /// A single frame could not be retrieved
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    /// Device release failed
    #[error("Camera release failed: {0}")]
    ReleaseFailed(String),

    /// Frame could not be written to storage
    #[error("Frame write failed: {0}")]
    WriteFailed(String),

    /// Capture worker misuse or failure
    #[error("Capture worker error: {0}")]
    Worker(String),
}

/// Encoding of a captured frame's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// JPEG as produced by the camera stack.
    Jpeg,
    /// Binary PPM (P6), used by the test-pattern camera.
    Ppm,
}

impl FrameFormat {
    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpg",
            FrameFormat::Ppm => "ppm",
        }
    }
}

/// One encoded still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Encoding of `data`.
    pub format: FrameFormat,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame from encoded bytes.
    pub fn new(format: FrameFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }
}

/// Trait defining the interface for still-image capture devices.
///
/// The capture worker owns the device while it runs and hands it back
/// on join, so `release()` can only happen after the last `read_frame()`.
pub trait CaptureDevice: Send {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Grab one frame.
    ///
    /// # Errors
    /// `CaptureError::FrameUnavailable` for a transient retrieval failure;
    /// the caller skips the cycle and tries again next period.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device.
    fn release(&mut self) -> Result<(), CaptureError>;
}
