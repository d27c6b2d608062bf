//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! of the rover binary. Every field carries a serde default, so an empty
//! (or missing) file yields the stock Raspberry Pi wiring.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rover_common::config::{ConfigError, RoverConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = RoverConfig::load_or_default(Path::new("rover.toml"))?;
//!     println!("Frames go to {}", config.capture.output_dir.display());
//!     Ok(())
//! }
//! ```

use crate::consts::{
    CAPTURE_FILE_PREFIX, CAPTURE_PERIOD_MS, DEFAULT_CAPTURE_DIR, DRIVE_PWM_FREQUENCY_HZ,
};
use crate::hal::types::PinMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Represents the verbosity level of logging output.
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "rover-01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "rover".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mapping of a BCM pin to a sysfs PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmChannel {
    /// BCM pin number routed to this channel.
    pub pin: u32,
    /// `pwmchipN` index.
    pub chip: u32,
    /// Channel index within the chip.
    pub channel: u32,
}

/// Paths and channel map for the Linux sysfs driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysfsConfig {
    /// GPIO class directory.
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// PWM class directory.
    #[serde(default = "default_pwm_root")]
    pub pwm_root: PathBuf,

    /// PWM channels, one per PWM-driven pin (enable and servo).
    /// The routing depends on the device-tree PWM overlay in use.
    #[serde(default = "default_pwm_channels")]
    pub pwm_channels: Vec<PwmChannel>,
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_pwm_root() -> PathBuf {
    PathBuf::from("/sys/class/pwm")
}

fn default_pwm_channels() -> Vec<PwmChannel> {
    let pins = PinMap::default();
    vec![
        PwmChannel {
            pin: pins.motor_enable,
            chip: 0,
            channel: 0,
        },
        PwmChannel {
            pin: pins.servo,
            chip: 0,
            channel: 1,
        },
    ]
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            gpio_root: default_gpio_root(),
            pwm_root: default_pwm_root(),
            pwm_channels: default_pwm_channels(),
        }
    }
}

impl SysfsConfig {
    /// PWM channel routed to `pin`, if any.
    pub fn channel_for(&self, pin: u32) -> Option<PwmChannel> {
        self.pwm_channels.iter().copied().find(|c| c.pin == pin)
    }
}

/// GPIO hardware configuration.
///
/// # TOML Example
///
/// ```toml
/// [hardware]
/// driver = "sysfs"
/// chip = 0
///
/// [hardware.pins]
/// motor_in1 = 17
/// motor_in2 = 27
/// motor_enable = 18
/// servo = 12
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// GPIO driver name ("sysfs" or "simulation").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// GPIO chip index.
    #[serde(default)]
    pub chip: u32,

    /// Actuator pin assignment.
    #[serde(default)]
    pub pins: PinMap,

    /// Motor enable line PWM frequency in Hz.
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency_hz: u32,

    /// Settings for the sysfs driver.
    #[serde(default)]
    pub sysfs: SysfsConfig,
}

fn default_driver() -> String {
    "sysfs".to_string()
}

fn default_pwm_frequency() -> u32 {
    DRIVE_PWM_FREQUENCY_HZ
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            chip: 0,
            pins: PinMap::default(),
            pwm_frequency_hz: default_pwm_frequency(),
            sysfs: SysfsConfig::default(),
        }
    }
}

impl HardwareConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - two actuator lines share a pin
    /// - `pwm_frequency_hz` is zero
    /// - the sysfs driver is selected and the enable or servo pin has no PWM channel
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pins.is_distinct() {
            return Err(ConfigError::ValidationError(format!(
                "actuator pins must be distinct: {:?}",
                self.pins.all()
            )));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::ValidationError(
                "pwm_frequency_hz must be greater than zero".to_string(),
            ));
        }
        if self.driver == "sysfs" {
            for pin in [self.pins.motor_enable, self.pins.servo] {
                if self.sysfs.channel_for(pin).is_none() {
                    return Err(ConfigError::ValidationError(format!(
                        "pin {pin} needs an entry in hardware.sysfs.pwm_channels"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Which capture device backs the capture worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptureDeviceKind {
    /// External still-capture command writing JPEG to stdout.
    #[default]
    Command,
    /// Generated test pattern, no camera required.
    Simulation,
}

/// Periodic still capture configuration.
///
/// # TOML Example
///
/// ```toml
/// [capture]
/// device = "command"
/// command = "rpicam-still"
/// output_dir = "/home/pi/Desktop/captured_images"
/// period_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture backend.
    #[serde(default)]
    pub device: CaptureDeviceKind,

    /// Still-capture program (command backend).
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments making `command` write one JPEG to stdout.
    #[serde(default = "default_command_args")]
    pub args: Vec<String>,

    /// Arguments of the startup probe; the camera counts as present when
    /// `command <probe_args>` exits successfully. Empty skips the probe.
    #[serde(default = "default_probe_args")]
    pub probe_args: Vec<String>,

    /// Directory receiving captured frames. Created if absent.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Sleep between capture attempts in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// File name prefix; files are named `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_command() -> String {
    "rpicam-still".to_string()
}

fn default_command_args() -> Vec<String> {
    ["--nopreview", "--immediate", "--encoding", "jpg", "--output", "-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_probe_args() -> Vec<String> {
    vec!["--list-cameras".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CAPTURE_DIR)
}

fn default_period_ms() -> u64 {
    CAPTURE_PERIOD_MS
}

fn default_file_prefix() -> String {
    CAPTURE_FILE_PREFIX.to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: CaptureDeviceKind::default(),
            command: default_command(),
            args: default_command_args(),
            probe_args: default_probe_args(),
            output_dir: default_output_dir(),
            period_ms: default_period_ms(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl CaptureConfig {
    /// Capture period as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `period_ms` is zero
    /// - `file_prefix` is empty or contains a path separator
    /// - the command backend is selected with an empty `command`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "capture.period_ms must be greater than zero".to_string(),
            ));
        }
        if self.file_prefix.is_empty() || self.file_prefix.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "invalid capture.file_prefix: {:?}",
                self.file_prefix
            )));
        }
        if self.device == CaptureDeviceKind::Command && self.command.is_empty() {
            return Err(ConfigError::ValidationError(
                "capture.command cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration of the rover binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverConfig {
    /// Logging and identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// GPIO driver and wiring.
    #[serde(default)]
    pub hardware: HardwareConfig,

    /// Periodic still capture.
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl RoverConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    ///
    /// The result is validated before it is returned.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(ConfigError::FileNotFound) => {
                info!("No configuration at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.hardware.validate()?;
        self.capture.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
