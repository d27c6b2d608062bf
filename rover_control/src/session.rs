//! One teleop run: startup, loop, shutdown.

use crate::capture::{CaptureWorker, FrameStore};
use crate::control::{ControlLoop, LoopExit};
use crate::error::RoverError;
use crate::keyboard::KeySource;
use crate::lifecycle::LifecycleFlag;
use crate::shutdown::{ShutdownReport, ShutdownSequencer};
use rover_common::camera::{CaptureDevice, CaptureError};
use rover_common::config::RoverConfig;
use rover_common::hal::driver::{GpioDriver, HalError};
use rover_hal::{ActuatorPort, DriverRegistry, open_capture_device};
use std::io::Write;
use tracing::info;

/// Acquired hardware plus the running capture worker.
///
/// Dropping a session without calling [`Session::shutdown`] still runs the
/// shutdown sequence.
pub struct Session {
    control: ControlLoop,
    sequencer: ShutdownSequencer,
}

impl Session {
    /// Create the configured GPIO driver and camera and start capturing.
    ///
    /// # Errors
    /// Any startup failure. Whatever was acquired before it is released.
    pub fn start(config: &RoverConfig, registry: &DriverRegistry) -> Result<Self, RoverError> {
        let driver = registry
            .create_driver(&config.hardware.driver, &config.hardware)
            .map_err(RoverError::GpioUnavailable)?;
        Self::start_with(config, driver, || open_capture_device(&config.capture))
    }

    /// Start with an explicit GPIO driver and camera constructor.
    ///
    /// GPIO is acquired first; the camera is only opened once the pins
    /// are claimed.
    ///
    /// # Errors
    /// Any startup failure. Whatever was acquired before it is released.
    pub fn start_with<F>(
        config: &RoverConfig,
        driver: Box<dyn GpioDriver>,
        open_camera: F,
    ) -> Result<Self, RoverError>
    where
        F: FnOnce() -> Result<Box<dyn CaptureDevice>, CaptureError>,
    {
        let flag = LifecycleFlag::new();
        let mut sequencer = ShutdownSequencer::new(flag.clone());

        let port = ActuatorPort::open(driver, &config.hardware)
            .map_err(RoverError::GpioUnavailable)?;
        info!("GPIO ready via '{}' driver", port.driver_name());
        sequencer.attach_actuators(port);

        let camera = open_camera().map_err(RoverError::CameraUnavailable)?;
        info!("Camera '{}' opened", camera.name());

        let store = FrameStore::new(&config.capture.output_dir, &config.capture.file_prefix);
        sequencer.attach_worker(CaptureWorker::new(
            camera,
            store,
            config.capture.period(),
            flag,
        ));
        if let Some(worker) = sequencer.worker_mut() {
            worker.start().map_err(RoverError::Worker)?;
        }

        Ok(Self {
            control: ControlLoop::new(),
            sequencer,
        })
    }

    /// Run the control loop until exit or end of input.
    ///
    /// # Errors
    /// Keyboard failures end the loop with an error; the session still
    /// needs shutting down.
    pub fn run<K, W>(&mut self, keys: &mut K, out: &mut W) -> Result<LoopExit, RoverError>
    where
        K: KeySource + ?Sized,
        W: Write + ?Sized,
    {
        let port = self
            .sequencer
            .actuators_mut()
            .ok_or(RoverError::GpioUnavailable(HalError::NotOpen))?;
        self.control.run(keys, port, out)
    }

    /// Control loop state.
    pub fn control(&self) -> &ControlLoop {
        &self.control
    }

    /// Stop capture and release all hardware.
    pub fn shutdown(self) -> ShutdownReport {
        self.sequencer.run()
    }
}
