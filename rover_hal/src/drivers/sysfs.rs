//! Linux sysfs GPIO/PWM driver.
//!
//! Direction lines are exported through the GPIO class directory
//! (`gpioN/direction`, `gpioN/value`); the enable and servo lines are
//! driven by hardware PWM channels (`pwmchipN/pwmM/{period,duty_cycle,enable}`).
//! The pin-to-channel routing comes from `[hardware.sysfs.pwm_channels]`.

use rover_common::config::{HardwareConfig, PwmChannel};
use rover_common::consts::SERVO_PERIOD_US;
use rover_common::hal::driver::{GpioDriver, HalError};
use rover_common::hal::types::PinLevel;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A pin claimed by this driver.
#[derive(Debug, Clone, Copy)]
enum ClaimedLine {
    /// Plain GPIO output, exported as `gpio<line>`.
    Gpio { pin: u32, line: u32 },
    /// PWM channel output.
    Pwm { pin: u32, channel: PwmChannel },
}

impl ClaimedLine {
    fn pin(&self) -> u32 {
        match self {
            ClaimedLine::Gpio { pin, .. } | ClaimedLine::Pwm { pin, .. } => *pin,
        }
    }
}

/// Sysfs driver implementing the GpioDriver trait.
pub struct SysfsDriver {
    gpio_root: PathBuf,
    pwm_root: PathBuf,
    channels: Vec<PwmChannel>,
    /// Global line number of pin 0 on the open chip.
    base: Option<u32>,
    claimed: Vec<ClaimedLine>,
}

impl SysfsDriver {
    /// Create a driver from the `[hardware.sysfs]` section.
    pub fn new(config: &HardwareConfig) -> Self {
        Self {
            gpio_root: config.sysfs.gpio_root.clone(),
            pwm_root: config.sysfs.pwm_root.clone(),
            channels: config.sysfs.pwm_channels.clone(),
            base: None,
            claimed: Vec::new(),
        }
    }

    fn ensure_open(&self) -> Result<u32, HalError> {
        self.base.ok_or(HalError::NotOpen)
    }

    fn find(&self, pin: u32) -> Result<ClaimedLine, HalError> {
        self.ensure_open()?;
        self.claimed
            .iter()
            .copied()
            .find(|c| c.pin() == pin)
            .ok_or(HalError::PinNotClaimed(pin))
    }

    fn pwm_channel(&self, pin: u32) -> Result<PwmChannel, HalError> {
        match self.find(pin)? {
            ClaimedLine::Pwm { channel, .. } => Ok(channel),
            ClaimedLine::Gpio { .. } => Err(HalError::InvalidArgument(format!(
                "pin {pin} has no PWM channel"
            ))),
        }
    }

    fn gpio_dir(&self, line: u32) -> PathBuf {
        self.gpio_root.join(format!("gpio{line}"))
    }

    fn pwm_dir(&self, channel: PwmChannel) -> PathBuf {
        self.pwm_root
            .join(format!("pwmchip{}", channel.chip))
            .join(format!("pwm{}", channel.channel))
    }

    /// Program period and duty (nanoseconds) and enable the channel.
    fn set_pwm(&self, channel: PwmChannel, period_ns: u64, duty_ns: u64) -> Result<(), HalError> {
        let dir = self.pwm_dir(channel);
        // Duty must never exceed the period, including transiently.
        write_attr(&dir.join("duty_cycle"), 0)?;
        write_attr(&dir.join("period"), period_ns)?;
        write_attr(&dir.join("duty_cycle"), duty_ns)?;
        write_attr(&dir.join("enable"), 1)
    }

    fn release(&self, claimed: ClaimedLine) -> Result<(), HalError> {
        match claimed {
            ClaimedLine::Gpio { line, .. } => {
                write_attr(&self.gpio_dir(line).join("value"), 0)?;
                write_attr(&self.gpio_root.join("unexport"), line)
            }
            ClaimedLine::Pwm { channel, .. } => {
                write_attr(&self.pwm_dir(channel).join("enable"), 0)?;
                write_attr(
                    &self
                        .pwm_root
                        .join(format!("pwmchip{}", channel.chip))
                        .join("unexport"),
                    channel.channel,
                )
            }
        }
    }
}

/// Write one sysfs attribute.
fn write_attr(path: &Path, value: impl Display) -> Result<(), HalError> {
    fs::write(path, value.to_string()).map_err(|e| HalError::Io(format!("{}: {}", path.display(), e)))
}

/// Read one sysfs attribute as an integer.
fn read_u32(path: &Path) -> Result<u32, HalError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| HalError::InitFailed(format!("{}: {}", path.display(), e)))?;
    raw.trim()
        .parse()
        .map_err(|e| HalError::InitFailed(format!("{}: {}", path.display(), e)))
}

/// Bases of all `gpiochip*` entries under `root`, ascending.
fn chip_bases(root: &Path) -> Result<Vec<u32>, HalError> {
    let entries = fs::read_dir(root)
        .map_err(|e| HalError::InitFailed(format!("{}: {}", root.display(), e)))?;

    let mut bases = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("gpiochip") {
            bases.push(read_u32(&entry.path().join("base"))?);
        }
    }
    bases.sort_unstable();
    Ok(bases)
}

impl GpioDriver for SysfsDriver {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn open(&mut self, chip: u32) -> Result<(), HalError> {
        if self.base.is_some() {
            return Err(HalError::InitFailed("GPIO chip already open".to_string()));
        }
        let bases = chip_bases(&self.gpio_root)?;
        let base = *bases.get(chip as usize).ok_or_else(|| {
            HalError::InitFailed(format!(
                "gpio chip {} not found under {} ({} chips)",
                chip,
                self.gpio_root.display(),
                bases.len()
            ))
        })?;
        info!("Opened GPIO chip {} (line base {})", chip, base);
        self.base = Some(base);
        Ok(())
    }

    fn claim_output(&mut self, pin: u32) -> Result<(), HalError> {
        let base = self.ensure_open()?;
        if self.claimed.iter().any(|c| c.pin() == pin) {
            return Err(HalError::InitFailed(format!("pin {pin} already claimed")));
        }

        let claimed = if let Some(channel) = self.channels.iter().copied().find(|c| c.pin == pin) {
            let dir = self.pwm_dir(channel);
            if !dir.exists() {
                let chip_dir = self.pwm_root.join(format!("pwmchip{}", channel.chip));
                write_attr(&chip_dir.join("export"), channel.channel)
                    .map_err(|e| HalError::InitFailed(e.to_string()))?;
            }
            if !dir.exists() {
                return Err(HalError::InitFailed(format!(
                    "{} did not appear after export",
                    dir.display()
                )));
            }
            write_attr(&dir.join("enable"), 0).map_err(|e| HalError::InitFailed(e.to_string()))?;
            debug!(
                "pin {} claimed as pwmchip{}/pwm{}",
                pin, channel.chip, channel.channel
            );
            ClaimedLine::Pwm { pin, channel }
        } else {
            let line = base + pin;
            let dir = self.gpio_dir(line);
            if !dir.exists() {
                write_attr(&self.gpio_root.join("export"), line)
                    .map_err(|e| HalError::InitFailed(e.to_string()))?;
            }
            if !dir.exists() {
                return Err(HalError::InitFailed(format!(
                    "{} did not appear after export",
                    dir.display()
                )));
            }
            // "low" configures the line as an output driven low in one step.
            write_attr(&dir.join("direction"), "low")
                .map_err(|e| HalError::InitFailed(e.to_string()))?;
            debug!("pin {} claimed as gpio{}", pin, line);
            ClaimedLine::Gpio { pin, line }
        };

        self.claimed.push(claimed);
        Ok(())
    }

    fn write(&mut self, pin: u32, level: PinLevel) -> Result<(), HalError> {
        match self.find(pin)? {
            ClaimedLine::Gpio { line, .. } => {
                write_attr(&self.gpio_dir(line).join("value"), level.as_u8())
            }
            ClaimedLine::Pwm { channel, .. } => {
                // Static level on a PWM line: 0% or 100% duty at the current period.
                let dir = self.pwm_dir(channel);
                match level {
                    PinLevel::Low => write_attr(&dir.join("enable"), 0),
                    PinLevel::High => {
                        let period = read_u32(&dir.join("period"))
                            .map_err(|e| HalError::Io(e.to_string()))?;
                        write_attr(&dir.join("duty_cycle"), period)?;
                        write_attr(&dir.join("enable"), 1)
                    }
                }
            }
        }
    }

    fn pwm(&mut self, pin: u32, frequency_hz: u32, duty_cycle: u8) -> Result<(), HalError> {
        if frequency_hz == 0 || duty_cycle > 100 {
            return Err(HalError::InvalidArgument(format!(
                "pwm {frequency_hz} Hz / {duty_cycle}%"
            )));
        }
        let channel = self.pwm_channel(pin)?;
        let period_ns = 1_000_000_000u64 / u64::from(frequency_hz);
        let duty_ns = period_ns * u64::from(duty_cycle) / 100;
        self.set_pwm(channel, period_ns, duty_ns)
    }

    fn servo_pulse(&mut self, pin: u32, width_us: u32) -> Result<(), HalError> {
        if width_us > SERVO_PERIOD_US {
            return Err(HalError::InvalidArgument(format!(
                "servo pulse {width_us} us exceeds period"
            )));
        }
        let channel = self.pwm_channel(pin)?;
        if width_us == 0 {
            return write_attr(&self.pwm_dir(channel).join("enable"), 0);
        }
        self.set_pwm(
            channel,
            u64::from(SERVO_PERIOD_US) * 1000,
            u64::from(width_us) * 1000,
        )
    }

    fn close(&mut self) -> Result<(), HalError> {
        self.ensure_open()?;

        let mut first_error = None;
        for claimed in self.claimed.iter().rev() {
            if let Err(e) = self.release(*claimed) {
                warn!("Failed to release pin {}: {}", claimed.pin(), e);
                first_error.get_or_insert(e);
            }
        }
        self.claimed.clear();
        self.base = None;
        info!("GPIO chip closed");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Factory function to create a sysfs driver instance.
pub fn create_driver(config: &HardwareConfig) -> Box<dyn GpioDriver> {
    Box::new(SysfsDriver::new(config))
}
