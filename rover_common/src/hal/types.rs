//! HAL pin and motion types.
//!
//! This module defines the values that cross the driver boundary:
//! - `PinLevel` - Logic level of a digital output
//! - `Direction` - H-bridge drive direction
//! - `PinMap` - BCM pin assignment of the four actuator lines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logic level of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinLevel {
    /// Line driven low (0).
    Low,
    /// Line driven high (1).
    High,
}

impl PinLevel {
    /// Numeric value as written to a GPIO value file.
    pub const fn as_u8(self) -> u8 {
        match self {
            PinLevel::Low => 0,
            PinLevel::High => 1,
        }
    }
}

/// Drive direction of the DC motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// IN1 high, IN2 low.
    Forward,
    /// IN1 low, IN2 high.
    Backward,
    /// IN1 low, IN2 low (coast).
    #[default]
    Stopped,
}

impl Direction {
    /// H-bridge input levels `(IN1, IN2)` for this direction.
    pub const fn bridge_levels(self) -> (PinLevel, PinLevel) {
        match self {
            Direction::Forward => (PinLevel::High, PinLevel::Low),
            Direction::Backward => (PinLevel::Low, PinLevel::High),
            Direction::Stopped => (PinLevel::Low, PinLevel::Low),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
            Direction::Stopped => write!(f, "stopped"),
        }
    }
}

/// BCM pin numbers of the actuator lines.
///
/// # TOML Example
///
/// ```toml
/// [hardware.pins]
/// motor_in1 = 17
/// motor_in2 = 27
/// motor_enable = 18
/// servo = 12
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMap {
    /// H-bridge direction input 1.
    #[serde(default = "default_in1")]
    pub motor_in1: u32,
    /// H-bridge direction input 2.
    #[serde(default = "default_in2")]
    pub motor_in2: u32,
    /// H-bridge enable (PWM speed) input.
    #[serde(default = "default_enable")]
    pub motor_enable: u32,
    /// Steering servo signal.
    #[serde(default = "default_servo")]
    pub servo: u32,
}

fn default_in1() -> u32 {
    17
}

fn default_in2() -> u32 {
    27
}

fn default_enable() -> u32 {
    18
}

fn default_servo() -> u32 {
    12
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            motor_in1: default_in1(),
            motor_in2: default_in2(),
            motor_enable: default_enable(),
            servo: default_servo(),
        }
    }
}

impl PinMap {
    /// All four pins in claim order.
    pub const fn all(&self) -> [u32; 4] {
        [self.motor_in1, self.motor_in2, self.motor_enable, self.servo]
    }

    /// Whether every pin is distinct.
    pub fn is_distinct(&self) -> bool {
        let pins = self.all();
        pins.iter()
            .enumerate()
            .all(|(i, p)| !pins[i + 1..].contains(p))
    }
}
