//! Operator-controlled motion and steering state.
//!
//! Both structs keep their fields private so every mutation goes through a
//! clamping transition: duty and speed stay in `0..=100`, the steering
//! angle in `MIN_ANGLE..=MAX_ANGLE`.

use rover_common::consts::{
    ANGLE_STEP, CENTER_ANGLE, INITIAL_SPEED, MAX_ANGLE, MAX_DUTY_CYCLE, MIN_ANGLE, SPEED_STEP,
};
use rover_common::hal::types::Direction;

// ─── Motion ─────────────────────────────────────────────────────────

/// Drive motor state.
///
/// `set_speed` is the operator's speed setting; `duty_cycle` is what was
/// last commanded on the enable line. They differ after a stop (`x`),
/// which zeroes the duty but keeps the setting for the next `w`/`s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionState {
    direction: Direction,
    duty_cycle: u8,
    set_speed: u8,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            direction: Direction::Stopped,
            duty_cycle: 0,
            set_speed: INITIAL_SPEED,
        }
    }
}

impl MotionState {
    /// Current direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Duty cycle last commanded, in percent.
    pub fn duty_cycle(&self) -> u8 {
        self.duty_cycle
    }

    /// Operator speed setting, in percent.
    pub fn set_speed(&self) -> u8 {
        self.set_speed
    }

    /// Drive in `direction` at the current speed setting.
    pub fn drive(&mut self, direction: Direction) {
        self.direction = direction;
        self.duty_cycle = self.set_speed;
    }

    /// Stop the motor; the speed setting is kept.
    pub fn stop(&mut self) {
        self.direction = Direction::Stopped;
        self.duty_cycle = 0;
    }

    /// Raise the speed setting by one step and apply it.
    pub fn speed_up(&mut self) {
        self.set_speed = self.set_speed.saturating_add(SPEED_STEP).min(MAX_DUTY_CYCLE);
        self.duty_cycle = self.set_speed;
    }

    /// Lower the speed setting by one step and apply it.
    pub fn slow_down(&mut self) {
        self.set_speed = self.set_speed.saturating_sub(SPEED_STEP);
        self.duty_cycle = self.set_speed;
    }
}

// ─── Steering ───────────────────────────────────────────────────────

/// Steering servo angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringState {
    angle: u8,
}

impl Default for SteeringState {
    fn default() -> Self {
        Self {
            angle: CENTER_ANGLE,
        }
    }
}

impl SteeringState {
    /// Current angle, always within `MIN_ANGLE..=MAX_ANGLE`.
    pub fn angle(&self) -> u8 {
        self.angle
    }

    /// Turn one step left.
    pub fn left(&mut self) {
        self.angle = self.angle.saturating_sub(ANGLE_STEP).max(MIN_ANGLE);
    }

    /// Turn one step right.
    pub fn right(&mut self) {
        self.angle = self.angle.saturating_add(ANGLE_STEP).min(MAX_ANGLE);
    }

    /// Return to center.
    pub fn center(&mut self) {
        self.angle = CENTER_ANGLE;
    }
}
