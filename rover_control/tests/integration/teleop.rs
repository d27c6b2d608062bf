//! Control loop scenarios over the simulation driver.

use super::support::{FakeCamera, sim_config, wait_until};
use proptest::prelude::*;
use rover_common::hal::driver::{GpioDriver, HalError};
use rover_common::hal::types::{Direction, PinLevel};
use rover_control::command::Command;
use rover_control::control::{ControlLoop, LoopExit};
use rover_control::keyboard::ScriptedKeys;
use rover_control::{RoverError, Session, ShutdownStep};
use rover_hal::DriverRegistry;
use rover_hal::drivers::simulation::{GpioOp, SimulationDriver};
use std::fs;
use std::io;
use std::time::Duration;

// ─── Scenarios ──────────────────────────────────────────────────────

#[test]
fn test_forward_speed_up_steer_right_then_exit() {
    let tmp = tempfile::tempdir().unwrap();
    let config = sim_config(tmp.path());
    let driver = SimulationDriver::new();
    let gpio = driver.probe();
    let camera = FakeCamera::absent().with_gpio(&gpio);
    let camera_log = camera.log();

    let mut session = Session::start_with(&config, Box::new(driver), || Ok(camera.boxed())).unwrap();
    let mut keys = ScriptedKeys::from_keys("w++dde");
    let mut out = Vec::<u8>::new();

    let exit = session.run(&mut keys, &mut out).unwrap();
    assert_eq!(exit, LoopExit::ExitKey);

    let motion = session.control().motion();
    assert_eq!(motion.direction(), Direction::Forward);
    assert_eq!(motion.duty_cycle(), 40);
    assert_eq!(session.control().steering().angle(), 65);

    assert_eq!(gpio.line(17).unwrap().level, PinLevel::High);
    assert_eq!(gpio.line(27).unwrap().level, PinLevel::Low);
    assert_eq!(gpio.line(18).unwrap().pwm, Some((1000, 40)));
    assert_eq!(gpio.line(12).unwrap().servo_us, 1900);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Motor forward at 30% speed"));
    assert!(text.contains("Speed increased to 40%"));
    assert!(text.contains("Steering angle 65°"));

    let report = session.shutdown();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(
        report.completed,
        vec![
            ShutdownStep::StopFlag,
            ShutdownStep::JoinCapture,
            ShutdownStep::StopActuators,
            ShutdownStep::ReleaseCamera,
            ShutdownStep::CloseGpio,
        ]
    );

    // stop_all reached the pins before the chip was closed.
    let ops = gpio.ops();
    let close_at = ops.iter().position(|op| *op == GpioOp::Close).unwrap();
    let stopped_at = ops
        .iter()
        .rposition(|op| *op == GpioOp::Servo { pin: 12, width_us: 0 })
        .unwrap();
    assert!(stopped_at < close_at);
    assert!(ops[..close_at].contains(&GpioOp::Pwm {
        pin: 18,
        frequency_hz: 1000,
        duty_cycle: 0
    }));

    // Camera released once, after stop_all and before close.
    let log = camera_log.lock();
    assert_eq!(log.releases, 1);
    assert_eq!(log.gpio_open_at_release, Some(true));
    let at_release = log.gpio_ops_at_release.as_ref().unwrap();
    assert!(at_release.contains(&GpioOp::Servo { pin: 12, width_us: 0 }));
    assert!(!at_release.contains(&GpioOp::Close));
}

#[test]
fn test_end_of_input_ends_loop() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::start_with(
        &sim_config(tmp.path()),
        Box::new(SimulationDriver::new()),
        || Ok(FakeCamera::absent().boxed()),
    )
    .unwrap();

    let exit = session
        .run(&mut ScriptedKeys::from_keys("ws"), &mut io::sink())
        .unwrap();
    assert_eq!(exit, LoopExit::EndOfInput);
    assert_eq!(session.control().motion().direction(), Direction::Backward);
    assert!(session.shutdown().is_clean());
}

#[test]
fn test_unbound_keys_touch_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = SimulationDriver::new();
    let gpio = driver.probe();
    let mut session = Session::start_with(&sim_config(tmp.path()), Box::new(driver), || {
        Ok(FakeCamera::absent().boxed())
    })
    .unwrap();
    gpio.clear_ops();

    let mut out = Vec::<u8>::new();
    session
        .run(&mut ScriptedKeys::from_keys("WqE \n"), &mut out)
        .unwrap();

    assert!(gpio.ops().is_empty());
    assert!(out.is_empty());
    let stats = session.control().stats();
    assert_eq!((stats.keys, stats.commands), (5, 0));
    session.shutdown();
}

#[test]
fn test_keys_after_exit_are_not_read() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::start_with(
        &sim_config(tmp.path()),
        Box::new(SimulationDriver::new()),
        || Ok(FakeCamera::absent().boxed()),
    )
    .unwrap();

    let mut keys = ScriptedKeys::new("ew".chars());
    session.run(&mut keys, &mut io::sink()).unwrap();
    assert_eq!(session.control().motion().direction(), Direction::Stopped);
    session.shutdown();
}

#[test]
fn test_hardware_error_is_reported_and_loop_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = SimulationDriver::new();
    let gpio = driver.probe();
    let mut session = Session::start_with(&sim_config(tmp.path()), Box::new(driver), || {
        Ok(FakeCamera::absent().boxed())
    })
    .unwrap();

    gpio.set_fail_io(true);
    let mut out = Vec::<u8>::new();
    let exit = session.run(&mut ScriptedKeys::from_keys("wd"), &mut out).unwrap();
    assert_eq!(exit, LoopExit::EndOfInput);
    assert_eq!(session.control().stats().hardware_errors, 2);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("Hardware error").count(), 2);

    gpio.set_fail_io(false);
    session
        .run(&mut ScriptedKeys::from_keys("d"), &mut io::sink())
        .unwrap();
    assert_eq!(session.control().steering().angle(), 65);
    assert_eq!(gpio.line(12).unwrap().servo_us, 1900);
    assert!(session.shutdown().is_clean());
}

/// Writer whose every call fails, like a closed stdout.
struct BrokenConsole;

impl io::Write for BrokenConsole {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }
}

#[test]
fn test_console_failure_does_not_end_loop() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = SimulationDriver::new();
    let gpio = driver.probe();
    let mut session = Session::start_with(&sim_config(tmp.path()), Box::new(driver), || {
        Ok(FakeCamera::absent().boxed())
    })
    .unwrap();

    let exit = session
        .run(&mut ScriptedKeys::from_keys("wdde"), &mut BrokenConsole)
        .unwrap();

    assert_eq!(exit, LoopExit::ExitKey);
    assert_eq!(session.control().stats().console_errors, 4);
    assert_eq!(gpio.line(18).unwrap().pwm, Some((1000, 30)));
    assert_eq!(gpio.line(12).unwrap().servo_us, 1900);
    assert!(session.shutdown().is_clean());
}

// ─── Startup ────────────────────────────────────────────────────────

#[test]
fn test_camera_unavailable_releases_gpio() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = SimulationDriver::new();
    let gpio = driver.probe();

    let result = Session::start_with(&sim_config(tmp.path()), Box::new(driver), || {
        Err(rover_common::camera::CaptureError::Unavailable(
            "no camera".to_string(),
        ))
    });

    assert!(matches!(result, Err(RoverError::CameraUnavailable(_))));
    assert!(result.err().unwrap().is_startup());
    assert!(!gpio.is_open());
    assert_eq!(gpio.close_count(), 1);
    assert!(gpio.ops().contains(&GpioOp::Servo { pin: 12, width_us: 0 }));
}

#[test]
fn test_gpio_unavailable_skips_camera() {
    let tmp = tempfile::tempdir().unwrap();
    let mut driver = SimulationDriver::new();
    driver.open(0).unwrap();

    let mut camera_opened = false;
    let result = Session::start_with(&sim_config(tmp.path()), Box::new(driver), || {
        camera_opened = true;
        Ok(FakeCamera::absent().boxed())
    });

    assert!(matches!(
        result,
        Err(RoverError::GpioUnavailable(HalError::InitFailed(_)))
    ));
    assert!(!camera_opened);
}

#[test]
fn test_unknown_driver_is_startup_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = sim_config(tmp.path());
    config.hardware.driver = "pigpio".to_string();

    let result = Session::start(&config, &DriverRegistry::with_builtin_drivers());
    assert!(matches!(
        result,
        Err(RoverError::GpioUnavailable(HalError::DriverNotFound(_)))
    ));
}

#[test]
fn test_dropped_session_still_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let driver = SimulationDriver::new();
    let gpio = driver.probe();
    let camera = FakeCamera::absent();
    let camera_log = camera.log();

    let mut session =
        Session::start_with(&sim_config(tmp.path()), Box::new(driver), || Ok(camera.boxed()))
            .unwrap();
    session
        .run(&mut ScriptedKeys::from_keys("w"), &mut io::sink())
        .unwrap();
    drop(session);

    assert!(!gpio.is_open());
    assert_eq!(camera_log.lock().releases, 1);
}

#[test]
fn test_simulated_run_saves_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let frames = tmp.path().join("frames");
    let config = sim_config(&frames);

    let mut session = Session::start(&config, &DriverRegistry::with_builtin_drivers()).unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        fs::read_dir(&frames).map(|d| d.count() > 0).unwrap_or(false)
    }));
    session
        .run(&mut ScriptedKeys::from_keys("e"), &mut io::sink())
        .unwrap();

    let report = session.shutdown();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.capture_stats.unwrap().frames_written >= 1);

    for entry in fs::read_dir(&frames).unwrap() {
        let name = entry.unwrap().file_name().into_string().unwrap();
        assert!(name.starts_with("captured_image_"), "{name}");
        assert!(name.ends_with(".ppm"), "{name}");
    }
}

// ─── State invariants ───────────────────────────────────────────────

fn command_keys() -> impl Strategy<Value = Vec<char>> {
    proptest::collection::vec(
        proptest::sample::select(vec!['w', 's', 'x', '+', '-', 'a', 'd', 'c', 'q']),
        0..200,
    )
}

proptest! {
    #[test]
    fn prop_speed_and_angle_stay_in_range(keys in command_keys()) {
        let mut control = ControlLoop::new();
        for key in keys {
            if let Some(command) = Command::from_key(key) {
                control.apply(command);
            }
            let motion = control.motion();
            prop_assert!(motion.set_speed() <= 100);
            prop_assert!(motion.duty_cycle() <= 100);
            prop_assert!((30..=80).contains(&control.steering().angle()));
        }
    }

    #[test]
    fn prop_center_and_stop_reset(keys in command_keys()) {
        let mut control = ControlLoop::new();
        for key in keys {
            if let Some(command) = Command::from_key(key) {
                control.apply(command);
            }
        }
        let speed = control.motion().set_speed();

        control.apply(Command::SteerCenter);
        prop_assert_eq!(control.steering().angle(), 55);

        control.apply(Command::Stop);
        prop_assert_eq!(control.motion().direction(), Direction::Stopped);
        prop_assert_eq!(control.motion().duty_cycle(), 0);
        prop_assert_eq!(control.motion().set_speed(), speed);
    }
}
