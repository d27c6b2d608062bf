//! Keyboard teleop loop.
//!
//! Decodes one keystroke at a time, updates [`MotionState`] /
//! [`SteeringState`] and forwards the resulting command to the
//! [`ActuatorPort`]. Hardware errors on dispatch are reported and the
//! loop carries on.

use crate::command::Command;
use crate::error::RoverError;
use crate::keyboard::KeySource;
use crate::state::{MotionState, SteeringState};
use rover_common::hal::driver::HalError;
use rover_common::hal::types::Direction;
use rover_hal::ActuatorPort;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Actuator command produced by one state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    /// `set_drive(direction, duty)`
    Drive(Direction, u8),
    /// `set_steering(angle)`
    Steer(u8),
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Operator pressed the exit key.
    ExitKey,
    /// Key source closed (EOF or interrupt).
    EndOfInput,
}

/// Counters for one loop run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Keys read, bound or not.
    pub keys: u64,
    /// Keys that decoded to a command.
    pub commands: u64,
    /// Dispatches rejected by the actuator port.
    pub hardware_errors: u64,
    /// Status lines that could not be written.
    pub console_errors: u64,
}

/// Foreground control loop state.
#[derive(Debug, Default)]
pub struct ControlLoop {
    motion: MotionState,
    steering: SteeringState,
    stats: LoopStats,
}

impl ControlLoop {
    /// Loop in the initial state: stopped, speed 30, steering centered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current motion state.
    pub fn motion(&self) -> MotionState {
        self.motion
    }

    /// Current steering state.
    pub fn steering(&self) -> SteeringState {
        self.steering
    }

    /// Counters so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Apply `command` to the state and return the actuator command it
    /// implies. `Exit` changes nothing and returns `None`.
    pub fn apply(&mut self, command: Command) -> Option<Actuation> {
        let motion = &mut self.motion;
        let steering = &mut self.steering;
        match command {
            Command::Forward => motion.drive(Direction::Forward),
            Command::Backward => motion.drive(Direction::Backward),
            Command::Stop => motion.stop(),
            Command::SpeedUp => motion.speed_up(),
            Command::SpeedDown => motion.slow_down(),
            Command::SteerLeft => steering.left(),
            Command::SteerRight => steering.right(),
            Command::SteerCenter => steering.center(),
            Command::Exit => return None,
        }

        Some(match command {
            Command::SteerLeft | Command::SteerRight | Command::SteerCenter => {
                Actuation::Steer(steering.angle())
            }
            _ => Actuation::Drive(motion.direction(), motion.duty_cycle()),
        })
    }

    /// Status line for an applied command.
    pub fn status_line(&self, command: Command) -> String {
        match command {
            Command::Forward | Command::Backward => format!(
                "Motor {} at {}% speed",
                self.motion.direction(),
                self.motion.duty_cycle()
            ),
            Command::Stop => "Motor stopped".to_string(),
            Command::SpeedUp => format!("Speed increased to {}%", self.motion.set_speed()),
            Command::SpeedDown => format!("Speed decreased to {}%", self.motion.set_speed()),
            Command::SteerLeft | Command::SteerRight | Command::SteerCenter => {
                format!("Steering angle {}°", self.steering.angle())
            }
            Command::Exit => "Exiting".to_string(),
        }
    }

    /// Read keys from `keys` until exit or end of input, driving `port`
    /// and writing status lines to `out`.
    ///
    /// # Errors
    /// Returns `RoverError::Keyboard` when reading keys fails. Hardware and
    /// status output errors are logged and the loop carries on.
    pub fn run<K, W>(
        &mut self,
        keys: &mut K,
        port: &mut ActuatorPort,
        out: &mut W,
    ) -> Result<LoopExit, RoverError>
    where
        K: KeySource + ?Sized,
        W: Write + ?Sized,
    {
        loop {
            let Some(key) = keys.next_key().map_err(RoverError::Keyboard)? else {
                info!("Key input ended");
                return Ok(LoopExit::EndOfInput);
            };
            self.stats.keys += 1;

            let Some(command) = Command::from_key(key) else {
                debug!("Ignoring key {:?}", key);
                continue;
            };
            self.stats.commands += 1;

            let Some(actuation) = self.apply(command) else {
                let line = self.status_line(command);
                self.print(out, &line);
                info!("Exit requested");
                return Ok(LoopExit::ExitKey);
            };

            let line = match dispatch(port, actuation) {
                Ok(()) => self.status_line(command),
                Err(e) => {
                    self.stats.hardware_errors += 1;
                    error!("{:?} failed: {}", actuation, e);
                    format!("Hardware error: {e}")
                }
            };
            self.print(out, &line);
        }
    }

    fn print<W: Write + ?Sized>(&mut self, out: &mut W, line: &str) {
        if !write_status(out, line) {
            self.stats.console_errors += 1;
        }
    }
}

/// Write one status line and flush. A failure is logged, never raised.
///
/// Returns `false` if the line could not be written.
pub fn write_status<W: Write + ?Sized>(out: &mut W, line: &str) -> bool {
    match writeln!(out, "{line}").and_then(|()| out.flush()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Status output failed: {}", e);
            false
        }
    }
}

fn dispatch(port: &mut ActuatorPort, actuation: Actuation) -> Result<(), HalError> {
    match actuation {
        Actuation::Drive(direction, duty) => port.set_drive(direction, duty),
        Actuation::Steer(angle) => port.set_steering(angle),
    }
}

/// Key binding help printed before the loop.
pub fn help_banner() -> String {
    let mut banner = String::from("Keyboard control:\n");
    for command in Command::ALL {
        banner.push_str(&format!("  {command}\n"));
    }
    banner
}
