//! Shared fixtures: a scripted camera and a simulation-backed config.

use parking_lot::Mutex;
use rover_common::camera::{CaptureDevice, CaptureError, Frame, FrameFormat};
use rover_common::config::{CaptureDeviceKind, RoverConfig};
use rover_control::LifecycleFlag;
use rover_hal::drivers::simulation::{GpioOp, SimulationProbe};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What the fake camera saw.
#[derive(Debug, Default, Clone)]
pub struct CameraLog {
    pub reads: usize,
    pub reads_after_stop: usize,
    pub releases: usize,
    pub gpio_ops_at_release: Option<Vec<GpioOp>>,
    pub gpio_open_at_release: Option<bool>,
}

pub struct FakeCamera {
    frame: Option<Frame>,
    fail_release: bool,
    flag: Option<LifecycleFlag>,
    gpio: Option<SimulationProbe>,
    log: Arc<Mutex<CameraLog>>,
}

impl FakeCamera {
    /// Camera that never yields a frame.
    pub fn absent() -> Self {
        Self {
            frame: None,
            fail_release: false,
            flag: None,
            gpio: None,
            log: Arc::default(),
        }
    }

    /// Camera that yields the same small JPEG every time.
    pub fn jpeg() -> Self {
        Self {
            frame: Some(Frame::new(FrameFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xD9])),
            ..Self::absent()
        }
    }

    /// Count reads made after `flag` was stopped.
    pub fn watching(mut self, flag: &LifecycleFlag) -> Self {
        self.flag = Some(flag.clone());
        self
    }

    /// Snapshot GPIO state when released.
    pub fn with_gpio(mut self, probe: &SimulationProbe) -> Self {
        self.gpio = Some(probe.clone());
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<CameraLog>> {
        Arc::clone(&self.log)
    }

    pub fn boxed(self) -> Box<dyn CaptureDevice> {
        Box::new(self)
    }
}

impl CaptureDevice for FakeCamera {
    fn name(&self) -> &str {
        "fake"
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut log = self.log.lock();
        log.reads += 1;
        if self.flag.as_ref().is_some_and(|flag| !flag.is_running()) {
            log.reads_after_stop += 1;
        }
        self.frame
            .clone()
            .ok_or_else(|| CaptureError::FrameUnavailable("no frame queued".to_string()))
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        let mut log = self.log.lock();
        log.releases += 1;
        if let Some(gpio) = &self.gpio {
            log.gpio_ops_at_release = Some(gpio.ops());
            log.gpio_open_at_release = Some(gpio.is_open());
        }
        if self.fail_release {
            return Err(CaptureError::ReleaseFailed("fake release failure".to_string()));
        }
        Ok(())
    }
}

/// Simulation driver, test-pattern camera, fast capture into `dir`.
pub fn sim_config(dir: &Path) -> RoverConfig {
    let mut config = RoverConfig::default();
    config.hardware.driver = "simulation".to_string();
    config.capture.device = CaptureDeviceKind::Simulation;
    config.capture.output_dir = dir.to_path_buf();
    config.capture.period_ms = 20;
    config
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
