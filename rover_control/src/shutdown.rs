//! Ordered release of everything acquired at startup.
//!
//! Steps, in order:
//!
//! 1. stop the lifecycle flag
//! 2. join the capture worker (taking the camera back)
//! 3. `stop_all()` on the actuators
//! 4. release the camera
//! 5. close the GPIO chip
//!
//! Every step is attempted even if an earlier one failed. Steps for
//! resources that were never attached are skipped. If the sequencer is
//! dropped without [`ShutdownSequencer::run`] having been called, the drop
//! runs it.

use crate::capture::{CaptureStats, CaptureWorker};
use crate::lifecycle::LifecycleFlag;
use rover_common::camera::CaptureDevice;
use rover_hal::ActuatorPort;
use std::fmt;
use tracing::{error, info, warn};

/// One shutdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStep {
    /// Clear the lifecycle flag.
    StopFlag,
    /// Join the capture thread.
    JoinCapture,
    /// Motor off, servo pulses off.
    StopActuators,
    /// Release the capture device.
    ReleaseCamera,
    /// Close the GPIO chip.
    CloseGpio,
}

impl fmt::Display for ShutdownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownStep::StopFlag => "stop flag",
            ShutdownStep::JoinCapture => "join capture worker",
            ShutdownStep::StopActuators => "stop actuators",
            ShutdownStep::ReleaseCamera => "release camera",
            ShutdownStep::CloseGpio => "close GPIO",
        };
        f.write_str(name)
    }
}

/// Outcome of a shutdown run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Steps that completed, in order.
    pub completed: Vec<ShutdownStep>,
    /// Steps that failed, with the error text.
    pub failures: Vec<(ShutdownStep, String)>,
    /// Capture counters, if the worker joined cleanly.
    pub capture_stats: Option<CaptureStats>,
}

impl ShutdownReport {
    /// `true` if no step failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn ok(&mut self, step: ShutdownStep) {
        self.completed.push(step);
    }

    fn fail(&mut self, step: ShutdownStep, reason: impl fmt::Display) {
        error!("Shutdown step '{}' failed: {}", step, reason);
        self.failures.push((step, reason.to_string()));
    }
}

/// Owner of the device handles and the capture worker until shutdown.
pub struct ShutdownSequencer {
    flag: LifecycleFlag,
    worker: Option<CaptureWorker>,
    camera: Option<Box<dyn CaptureDevice>>,
    port: Option<ActuatorPort>,
    finished: bool,
}

impl ShutdownSequencer {
    /// Sequencer that will stop `flag` first.
    pub fn new(flag: LifecycleFlag) -> Self {
        Self {
            flag,
            worker: None,
            camera: None,
            port: None,
            finished: false,
        }
    }

    /// Hand the actuator port to the sequencer.
    pub fn attach_actuators(&mut self, port: ActuatorPort) {
        self.port = Some(port);
    }

    /// Hand over a camera that is not owned by a worker.
    pub fn attach_camera(&mut self, camera: Box<dyn CaptureDevice>) {
        self.camera = Some(camera);
    }

    /// Hand over the capture worker (and with it, its camera).
    pub fn attach_worker(&mut self, worker: CaptureWorker) {
        self.worker = Some(worker);
    }

    /// Borrow the actuator port, if attached.
    pub fn actuators_mut(&mut self) -> Option<&mut ActuatorPort> {
        self.port.as_mut()
    }

    /// Borrow the capture worker, if attached.
    pub fn worker_mut(&mut self) -> Option<&mut CaptureWorker> {
        self.worker.as_mut()
    }

    /// Run the shutdown steps and return the report.
    pub fn run(mut self) -> ShutdownReport {
        self.execute()
    }

    fn execute(&mut self) -> ShutdownReport {
        self.finished = true;
        let mut report = ShutdownReport::default();
        info!("Shutting down");

        self.flag.stop();
        report.ok(ShutdownStep::StopFlag);

        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(outcome) => {
                    report.capture_stats = Some(outcome.stats);
                    self.camera = Some(outcome.device);
                    report.ok(ShutdownStep::JoinCapture);
                }
                Err(e) => report.fail(ShutdownStep::JoinCapture, e),
            }
        }

        if let Some(port) = self.port.as_mut() {
            match port.stop_all() {
                Ok(()) => report.ok(ShutdownStep::StopActuators),
                Err(e) => report.fail(ShutdownStep::StopActuators, e),
            }
        }

        if let Some(mut camera) = self.camera.take() {
            match camera.release() {
                Ok(()) => report.ok(ShutdownStep::ReleaseCamera),
                Err(e) => report.fail(ShutdownStep::ReleaseCamera, e),
            }
        }

        if let Some(mut port) = self.port.take() {
            match port.close() {
                Ok(()) => report.ok(ShutdownStep::CloseGpio),
                Err(e) => report.fail(ShutdownStep::CloseGpio, e),
            }
        }

        if report.is_clean() {
            info!("Shutdown complete ({} steps)", report.completed.len());
        } else {
            warn!(
                "Shutdown finished with {} failed step(s)",
                report.failures.len()
            );
        }
        report
    }
}

impl Drop for ShutdownSequencer {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Shutdown sequencer dropped without explicit run; cleaning up");
            self.execute();
        }
    }
}
