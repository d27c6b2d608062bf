//! Simulation GPIO driver.
//!
//! Keeps the state of every claimed line in memory and records each call
//! in an operation log. A [`SimulationProbe`] shares that state so tests
//! (and the dry-run binary) can inspect what the hardware would have seen
//! after the driver has been handed to the actuator port.

use parking_lot::Mutex;
use rover_common::config::HardwareConfig;
use rover_common::consts::SERVO_PERIOD_US;
use rover_common::hal::driver::{GpioDriver, HalError};
use rover_common::hal::types::PinLevel;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioOp {
    /// `open(chip)`
    Open(u32),
    /// `claim_output(pin)`
    Claim(u32),
    /// `write(pin, level)`
    Write(u32, PinLevel),
    /// `pwm(pin, frequency_hz, duty_cycle)`
    Pwm {
        /// Pin
        pin: u32,
        /// Frequency in Hz
        frequency_hz: u32,
        /// Duty cycle in percent
        duty_cycle: u8,
    },
    /// `servo_pulse(pin, width_us)`
    Servo {
        /// Pin
        pin: u32,
        /// Pulse width in microseconds
        width_us: u32,
    },
    /// `close()`
    Close,
}

/// Simulated output state of one claimed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineState {
    /// Static level (ignored while a PWM or servo signal is active).
    pub level: PinLevel,
    /// Active PWM as `(frequency_hz, duty_cycle)`.
    pub pwm: Option<(u32, u8)>,
    /// Active servo pulse width in microseconds (0 = off).
    pub servo_us: u32,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            level: PinLevel::Low,
            pwm: None,
            servo_us: 0,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    chip: Option<u32>,
    lines: BTreeMap<u32, LineState>,
    ops: Vec<GpioOp>,
    open_count: u32,
    close_count: u32,
    fail_io: bool,
    failing_pins: BTreeSet<u32>,
}

/// Shared view into a [`SimulationDriver`]'s state.
#[derive(Debug, Clone)]
pub struct SimulationProbe {
    state: Arc<Mutex<SimState>>,
}

impl SimulationProbe {
    /// Every call recorded so far, oldest first.
    pub fn ops(&self) -> Vec<GpioOp> {
        self.state.lock().ops.clone()
    }

    /// Forget the recorded calls (line state is kept).
    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    /// Snapshot of all claimed lines.
    pub fn lines(&self) -> BTreeMap<u32, LineState> {
        self.state.lock().lines.clone()
    }

    /// State of one claimed line.
    pub fn line(&self, pin: u32) -> Option<LineState> {
        self.state.lock().lines.get(&pin).copied()
    }

    /// Whether the chip is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().chip.is_some()
    }

    /// Number of successful `open()` calls.
    pub fn open_count(&self) -> u32 {
        self.state.lock().open_count
    }

    /// Number of successful `close()` calls.
    pub fn close_count(&self) -> u32 {
        self.state.lock().close_count
    }

    /// Make every subsequent write/pwm/servo call fail with `HalError::Io`.
    pub fn set_fail_io(&self, fail: bool) {
        self.state.lock().fail_io = fail;
    }

    /// Make write/pwm/servo calls on `pin` alone fail with `HalError::Io`.
    pub fn set_fail_pin(&self, pin: u32, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing_pins.insert(pin);
        } else {
            state.failing_pins.remove(&pin);
        }
    }
}

/// Simulation driver implementing the GpioDriver trait.
pub struct SimulationDriver {
    state: Arc<Mutex<SimState>>,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Probe sharing this driver's state.
    pub fn probe(&self) -> SimulationProbe {
        SimulationProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks shared by all output calls; returns the line to update.
fn output_line(state: &mut SimState, pin: u32) -> Result<&mut LineState, HalError> {
    if state.chip.is_none() {
        return Err(HalError::NotOpen);
    }
    if state.fail_io || state.failing_pins.contains(&pin) {
        return Err(HalError::Io(format!("simulated write failure on pin {pin}")));
    }
    state
        .lines
        .get_mut(&pin)
        .ok_or(HalError::PinNotClaimed(pin))
}

impl GpioDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn open(&mut self, chip: u32) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.chip.is_some() {
            return Err(HalError::InitFailed(format!(
                "gpiochip{chip} already open"
            )));
        }
        state.chip = Some(chip);
        state.open_count += 1;
        state.ops.push(GpioOp::Open(chip));
        debug!("Simulated gpiochip{} opened", chip);
        Ok(())
    }

    fn claim_output(&mut self, pin: u32) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.chip.is_none() {
            return Err(HalError::NotOpen);
        }
        if state.lines.contains_key(&pin) {
            return Err(HalError::InitFailed(format!("pin {pin} already claimed")));
        }
        state.lines.insert(pin, LineState::default());
        state.ops.push(GpioOp::Claim(pin));
        Ok(())
    }

    fn write(&mut self, pin: u32, level: PinLevel) -> Result<(), HalError> {
        let mut state = self.state.lock();
        let line = output_line(&mut state, pin)?;
        line.level = level;
        line.pwm = None;
        state.ops.push(GpioOp::Write(pin, level));
        trace!("pin {} -> {:?}", pin, level);
        Ok(())
    }

    fn pwm(&mut self, pin: u32, frequency_hz: u32, duty_cycle: u8) -> Result<(), HalError> {
        if frequency_hz == 0 || duty_cycle > 100 {
            return Err(HalError::InvalidArgument(format!(
                "pwm {frequency_hz} Hz / {duty_cycle}%"
            )));
        }
        let mut state = self.state.lock();
        let line = output_line(&mut state, pin)?;
        line.pwm = Some((frequency_hz, duty_cycle));
        state.ops.push(GpioOp::Pwm {
            pin,
            frequency_hz,
            duty_cycle,
        });
        trace!("pin {} pwm {} Hz {}%", pin, frequency_hz, duty_cycle);
        Ok(())
    }

    fn servo_pulse(&mut self, pin: u32, width_us: u32) -> Result<(), HalError> {
        if width_us > SERVO_PERIOD_US {
            return Err(HalError::InvalidArgument(format!(
                "servo pulse {width_us} us exceeds period"
            )));
        }
        let mut state = self.state.lock();
        let line = output_line(&mut state, pin)?;
        line.servo_us = width_us;
        state.ops.push(GpioOp::Servo { pin, width_us });
        trace!("pin {} servo {} us", pin, width_us);
        Ok(())
    }

    fn close(&mut self) -> Result<(), HalError> {
        let mut state = self.state.lock();
        let Some(chip) = state.chip.take() else {
            return Err(HalError::NotOpen);
        };
        state.lines.clear();
        state.close_count += 1;
        state.ops.push(GpioOp::Close);
        debug!("Simulated gpiochip{} closed", chip);
        Ok(())
    }
}

/// Factory function to create a simulation driver instance.
pub fn create_driver(_config: &HardwareConfig) -> Box<dyn GpioDriver> {
    Box::new(SimulationDriver::new())
}
