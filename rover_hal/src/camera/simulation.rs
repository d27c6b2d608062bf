//! Test-pattern camera for running without a camera module.

use rover_common::camera::{CaptureDevice, CaptureError, Frame, FrameFormat};

/// Generates a moving colour gradient as binary PPM frames.
#[derive(Debug)]
pub struct TestPatternCamera {
    width: u32,
    height: u32,
    frame_count: u32,
    released: bool,
}

impl TestPatternCamera {
    /// Create a camera producing `width` x `height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_count: 0,
            released: false,
        }
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn render(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut data = Vec::with_capacity(header.len() + (self.width * self.height * 3) as usize);
        data.extend_from_slice(header.as_bytes());

        let shift = self.frame_count.wrapping_mul(8);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(((x + shift) % 256) as u8);
                data.push(((y + shift) % 256) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        data
    }
}

impl CaptureDevice for TestPatternCamera {
    fn name(&self) -> &str {
        "simulation"
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::FrameUnavailable(
                "simulation camera released".to_string(),
            ));
        }
        let frame = Frame::new(FrameFormat::Ppm, self.render());
        self.frame_count += 1;
        Ok(frame)
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        if self.released {
            return Err(CaptureError::ReleaseFailed(
                "simulation camera already released".to_string(),
            ));
        }
        self.released = true;
        Ok(())
    }
}
