//! Still capture through an external camera program.
//!
//! Each `read_frame()` runs `command args...` and takes its stdout as one
//! JPEG. With the defaults this is
//! `rpicam-still --nopreview --immediate --encoding jpg --output -`.

use rover_common::camera::{CaptureDevice, CaptureError, Frame, FrameFormat};
use rover_common::config::CaptureConfig;
use std::process::{Command, Stdio};
use tracing::info;

/// Capture device backed by a still-capture program.
#[derive(Debug)]
pub struct CommandCamera {
    command: String,
    args: Vec<String>,
    label: String,
    released: bool,
}

impl CommandCamera {
    /// Probe the camera and return an open device.
    ///
    /// The probe runs `command probe_args...`; a spawn failure or non-zero
    /// exit means no camera.
    ///
    /// # Errors
    /// Returns `CaptureError::Unavailable` if the probe fails.
    pub fn open(config: &CaptureConfig) -> Result<Self, CaptureError> {
        if !config.probe_args.is_empty() {
            let output = Command::new(&config.command)
                .args(&config.probe_args)
                .stdin(Stdio::null())
                .output()
                .map_err(|e| CaptureError::Unavailable(format!("{}: {}", config.command, e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CaptureError::Unavailable(format!(
                    "{} probe exited with {}: {}",
                    config.command,
                    output.status,
                    stderr.trim()
                )));
            }
            info!("Camera probe '{}' succeeded", config.command);
        }

        Ok(Self {
            command: config.command.clone(),
            args: config.args.clone(),
            label: format!("command:{}", config.command),
            released: false,
        })
    }
}

impl CaptureDevice for CommandCamera {
    fn name(&self) -> &str {
        &self.label
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::FrameUnavailable(format!(
                "{} released",
                self.label
            )));
        }

        let output = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                CaptureError::FrameUnavailable(format!("{} failed to start: {}", self.command, e))
            })?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(CaptureError::FrameUnavailable(format!(
                "{} returned no frame ({}, {} bytes)",
                self.command,
                output.status,
                output.stdout.len()
            )));
        }

        Ok(Frame::new(FrameFormat::Jpeg, output.stdout))
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        if self.released {
            return Err(CaptureError::ReleaseFailed(format!(
                "{} already released",
                self.label
            )));
        }
        self.released = true;
        Ok(())
    }
}
