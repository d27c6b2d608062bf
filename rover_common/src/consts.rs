//! System-wide constants for the rover workspace.
//!
//! Single source of truth for drive, steering and capture limits.
//! Imported by all crates; never redefine these locally.

use static_assertions::const_assert;

/// Maximum motor duty cycle in percent.
pub const MAX_DUTY_CYCLE: u8 = 100;

/// Speed setting at startup in percent.
pub const INITIAL_SPEED: u8 = 30;

/// Speed change per `+` / `-` keystroke in percent.
pub const SPEED_STEP: u8 = 5;

/// Motor enable line PWM frequency (1 kHz).
pub const DRIVE_PWM_FREQUENCY_HZ: u32 = 1000;

/// Lowest commanded steering angle in degrees.
pub const MIN_ANGLE: u8 = 30;

/// Highest commanded steering angle in degrees.
pub const MAX_ANGLE: u8 = 80;

/// Straight-ahead steering angle in degrees.
pub const CENTER_ANGLE: u8 = 55;

/// Steering change per `a` / `d` keystroke in degrees.
pub const ANGLE_STEP: u8 = 5;

/// Servo pulse width at [`MIN_ANGLE`] in microseconds.
pub const MIN_PULSE_US: u32 = 500;

/// Servo pulse width at [`MAX_ANGLE`] in microseconds.
pub const MAX_PULSE_US: u32 = 2500;

/// Servo frame period (50 Hz) in microseconds.
pub const SERVO_PERIOD_US: u32 = 20_000;

/// Default capture period in milliseconds.
pub const CAPTURE_PERIOD_MS: u64 = 500;

/// File name prefix for captured frames.
pub const CAPTURE_FILE_PREFIX: &str = "captured_image";

/// Default directory for captured frames.
pub const DEFAULT_CAPTURE_DIR: &str = "/home/pi/Desktop/captured_images";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rover/rover.toml";

const_assert!(MIN_ANGLE <= CENTER_ANGLE && CENTER_ANGLE <= MAX_ANGLE);
const_assert!(INITIAL_SPEED <= MAX_DUTY_CYCLE);
const_assert!(MIN_PULSE_US < MAX_PULSE_US && MAX_PULSE_US < SERVO_PERIOD_US);
