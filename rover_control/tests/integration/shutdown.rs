//! Shutdown ordering and partial-failure handling.

use super::support::FakeCamera;
use rover_common::config::HardwareConfig;
use rover_control::capture::{CaptureWorker, FrameStore};
use rover_control::{LifecycleFlag, ShutdownSequencer, ShutdownStep};
use rover_hal::ActuatorPort;
use rover_hal::drivers::simulation::{GpioOp, SimulationDriver, SimulationProbe};
use std::time::Duration;

fn port() -> (ActuatorPort, SimulationProbe) {
    let driver = SimulationDriver::new();
    let probe = driver.probe();
    let port = ActuatorPort::open(Box::new(driver), &HardwareConfig::default()).unwrap();
    (port, probe)
}

fn started_worker(camera: FakeCamera, flag: &LifecycleFlag) -> (CaptureWorker, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut worker = CaptureWorker::new(
        camera.boxed(),
        FrameStore::new(tmp.path(), "img"),
        Duration::from_millis(5),
        flag.clone(),
    );
    worker.start().unwrap();
    (worker, tmp)
}

#[test]
fn test_nothing_attached_only_stops_flag() {
    let flag = LifecycleFlag::new();
    let report = ShutdownSequencer::new(flag.clone()).run();

    assert!(!flag.is_running());
    assert_eq!(report.completed, vec![ShutdownStep::StopFlag]);
    assert!(report.is_clean());
    assert!(report.capture_stats.is_none());
}

#[test]
fn test_camera_release_failure_still_closes_gpio() {
    let flag = LifecycleFlag::new();
    let (port, gpio) = port();
    let camera = FakeCamera::absent().failing_release();
    let camera_log = camera.log();
    let (worker, _tmp) = started_worker(camera, &flag);

    let mut sequencer = ShutdownSequencer::new(flag);
    sequencer.attach_actuators(port);
    sequencer.attach_worker(worker);
    let report = sequencer.run();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, ShutdownStep::ReleaseCamera);
    assert!(report.completed.contains(&ShutdownStep::CloseGpio));
    assert!(!gpio.is_open());
    assert_eq!(camera_log.lock().releases, 1);
}

#[test]
fn test_stop_failure_still_releases_everything() {
    let flag = LifecycleFlag::new();
    let (port, gpio) = port();
    let camera = FakeCamera::absent();
    let camera_log = camera.log();

    let mut sequencer = ShutdownSequencer::new(flag);
    sequencer.attach_actuators(port);
    sequencer.attach_camera(camera.boxed());
    gpio.set_fail_io(true);
    let report = sequencer.run();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, ShutdownStep::StopActuators);
    assert_eq!(
        report.completed,
        vec![
            ShutdownStep::StopFlag,
            ShutdownStep::ReleaseCamera,
            ShutdownStep::CloseGpio,
        ]
    );
    assert_eq!(camera_log.lock().releases, 1);
    assert_eq!(gpio.close_count(), 1);
}

#[test]
fn test_worker_joined_before_camera_release() {
    let flag = LifecycleFlag::new();
    let (port, gpio) = port();
    let camera = FakeCamera::jpeg().watching(&flag).with_gpio(&gpio);
    let camera_log = camera.log();
    let (worker, _tmp) = started_worker(camera, &flag);

    let mut sequencer = ShutdownSequencer::new(flag);
    sequencer.attach_actuators(port);
    sequencer.attach_worker(worker);
    let report = sequencer.run();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.capture_stats.is_some());
    let log = camera_log.lock();
    assert!(log.reads_after_stop <= 1);
    assert_eq!(log.gpio_open_at_release, Some(true));
    assert!(
        log.gpio_ops_at_release
            .as_ref()
            .unwrap()
            .contains(&GpioOp::Servo { pin: 12, width_us: 0 })
    );
}

#[test]
fn test_drop_runs_sequence_once() {
    let flag = LifecycleFlag::new();
    let (port, gpio) = port();
    let camera = FakeCamera::absent();
    let camera_log = camera.log();

    {
        let mut sequencer = ShutdownSequencer::new(flag.clone());
        sequencer.attach_actuators(port);
        sequencer.attach_camera(camera.boxed());
        assert!(sequencer.actuators_mut().is_some());
    }

    assert!(!flag.is_running());
    assert_eq!(gpio.close_count(), 1);
    assert_eq!(camera_log.lock().releases, 1);
}
