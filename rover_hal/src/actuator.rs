//! Actuator port: H-bridge drive and steering servo over a GPIO driver.
//!
//! The port owns the driver for the whole run. It opens the chip and
//! claims the four actuator lines on construction and closes the chip
//! exactly once, either through [`ActuatorPort::close`] or on drop.
//!
//! ## Drive truth table
//!
//! | Direction | IN1  | IN2  | ENA            |
//! |-----------|------|------|----------------|
//! | Forward   | high | low  | 1 kHz PWM, duty |
//! | Backward  | low  | high | 1 kHz PWM, duty |
//! | Stopped   | low  | low  | 1 kHz PWM, duty |

use rover_common::consts::{MAX_PULSE_US, MIN_PULSE_US};
use rover_common::prelude::*;
use tracing::{debug, info, warn};

/// Servo pulse width for a steering angle.
///
/// Maps `[MIN_ANGLE, MAX_ANGLE]` linearly onto `[MIN_PULSE_US, MAX_PULSE_US]`
/// (30° → 500 µs, 55° → 1500 µs, 80° → 2500 µs).
pub const fn pulse_width_us(angle: u8) -> u32 {
    let span_us = MAX_PULSE_US - MIN_PULSE_US;
    let span_deg = (MAX_ANGLE - MIN_ANGLE) as u32;
    MIN_PULSE_US + (angle.saturating_sub(MIN_ANGLE) as u32) * span_us / span_deg
}

/// Drive and steering commands against an open GPIO chip.
pub struct ActuatorPort {
    driver: Box<dyn GpioDriver>,
    pins: PinMap,
    pwm_frequency_hz: u32,
    closed: bool,
}

impl ActuatorPort {
    /// Open `config.chip` on `driver` and claim the actuator pins.
    ///
    /// # Errors
    /// Returns the driver error if the chip cannot be opened or a pin cannot
    /// be claimed. The chip is closed again before returning in the latter case.
    pub fn open(mut driver: Box<dyn GpioDriver>, config: &HardwareConfig) -> Result<Self, HalError> {
        info!(
            "Opening GPIO chip {} with driver {} v{}",
            config.chip,
            driver.name(),
            driver.version()
        );
        driver.open(config.chip)?;

        for pin in config.pins.all() {
            if let Err(e) = driver.claim_output(pin) {
                if let Err(close_err) = driver.close() {
                    warn!("Failed to close GPIO chip after claim error: {}", close_err);
                }
                return Err(e);
            }
        }

        info!(
            "Actuator pins claimed: IN1={} IN2={} ENA={} SERVO={}",
            config.pins.motor_in1, config.pins.motor_in2, config.pins.motor_enable, config.pins.servo
        );
        Ok(Self {
            driver,
            pins: config.pins,
            pwm_frequency_hz: config.pwm_frequency_hz,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<(), HalError> {
        if self.closed {
            Err(HalError::NotOpen)
        } else {
            Ok(())
        }
    }

    /// Set the H-bridge direction lines, then the enable PWM at `duty_cycle` percent.
    ///
    /// # Errors
    /// `InvalidArgument` if `duty_cycle > 100`; `Io` if the hardware write fails.
    pub fn set_drive(&mut self, direction: Direction, duty_cycle: u8) -> Result<(), HalError> {
        self.ensure_open()?;
        if duty_cycle > MAX_DUTY_CYCLE {
            return Err(HalError::InvalidArgument(format!(
                "duty cycle {duty_cycle}% outside 0..={MAX_DUTY_CYCLE}"
            )));
        }

        let (in1, in2) = direction.bridge_levels();
        self.driver.write(self.pins.motor_in1, in1)?;
        self.driver.write(self.pins.motor_in2, in2)?;
        self.driver
            .pwm(self.pins.motor_enable, self.pwm_frequency_hz, duty_cycle)?;
        debug!("Drive {} at {}%", direction, duty_cycle);
        Ok(())
    }

    /// Move the steering servo to `angle` degrees.
    ///
    /// # Errors
    /// `InvalidArgument` if `angle` is outside `[MIN_ANGLE, MAX_ANGLE]`;
    /// `Io` if the hardware write fails.
    pub fn set_steering(&mut self, angle: u8) -> Result<(), HalError> {
        self.ensure_open()?;
        if !(MIN_ANGLE..=MAX_ANGLE).contains(&angle) {
            return Err(HalError::InvalidArgument(format!(
                "steering angle {angle} outside {MIN_ANGLE}..={MAX_ANGLE}"
            )));
        }

        let width_us = pulse_width_us(angle);
        self.driver.servo_pulse(self.pins.servo, width_us)?;
        debug!("Steering {}° ({} us)", angle, width_us);
        Ok(())
    }

    /// Stop the motor and switch the servo pulses off.
    ///
    /// Enable duty goes to 0 first, then both direction lines low, then a
    /// zero servo pulse. Every write is attempted; the first error is
    /// returned.
    pub fn stop_all(&mut self) -> Result<(), HalError> {
        self.ensure_open()?;
        let pins = self.pins;
        let results = [
            self.driver.pwm(pins.motor_enable, self.pwm_frequency_hz, 0),
            self.driver.write(pins.motor_in1, PinLevel::Low),
            self.driver.write(pins.motor_in2, PinLevel::Low),
            self.driver.servo_pulse(pins.servo, 0),
        ];
        for e in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!("stop_all: {}", e);
        }
        results.into_iter().collect()
    }

    /// Close the GPIO chip. Later calls are no-ops.
    pub fn close(&mut self) -> Result<(), HalError> {
        if self.closed {
            debug!("GPIO chip already closed");
            return Ok(());
        }
        self.closed = true;
        self.driver.close()
    }

    /// Whether the chip has been released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Name of the underlying driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }
}

impl Drop for ActuatorPort {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!("ActuatorPort dropped while open; stopping actuators");
        if let Err(e) = self.stop_all() {
            warn!("stop_all on drop failed: {}", e);
        }
        if let Err(e) = self.close() {
            warn!("GPIO close on drop failed: {}", e);
        }
    }
}
