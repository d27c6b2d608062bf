//! Operator key bindings.

use std::fmt;

/// One operator command, decoded from a single keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `w`
    Forward,
    /// `s`
    Backward,
    /// `x`
    Stop,
    /// `+`
    SpeedUp,
    /// `-`
    SpeedDown,
    /// `a`
    SteerLeft,
    /// `d`
    SteerRight,
    /// `c`
    SteerCenter,
    /// `e`
    Exit,
}

impl Command {
    /// All commands, in help-banner order.
    pub const ALL: [Command; 9] = [
        Command::Forward,
        Command::Backward,
        Command::Stop,
        Command::SpeedUp,
        Command::SpeedDown,
        Command::SteerLeft,
        Command::SteerRight,
        Command::SteerCenter,
        Command::Exit,
    ];

    /// Decode a keystroke. Matching is exact: `W` is not `w`.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'w' => Some(Command::Forward),
            's' => Some(Command::Backward),
            'x' => Some(Command::Stop),
            '+' => Some(Command::SpeedUp),
            '-' => Some(Command::SpeedDown),
            'a' => Some(Command::SteerLeft),
            'd' => Some(Command::SteerRight),
            'c' => Some(Command::SteerCenter),
            'e' => Some(Command::Exit),
            _ => None,
        }
    }

    /// Key bound to this command.
    pub const fn key(self) -> char {
        match self {
            Command::Forward => 'w',
            Command::Backward => 's',
            Command::Stop => 'x',
            Command::SpeedUp => '+',
            Command::SpeedDown => '-',
            Command::SteerLeft => 'a',
            Command::SteerRight => 'd',
            Command::SteerCenter => 'c',
            Command::Exit => 'e',
        }
    }

    /// Help text for the banner.
    pub const fn description(self) -> &'static str {
        match self {
            Command::Forward => "motor forward",
            Command::Backward => "motor backward",
            Command::Stop => "motor stop",
            Command::SpeedUp => "increase speed",
            Command::SpeedDown => "decrease speed",
            Command::SteerLeft => "steer left",
            Command::SteerRight => "steer right",
            Command::SteerCenter => "center steering",
            Command::Exit => "exit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.key(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping_round_trips() {
        for command in Command::ALL {
            assert_eq!(Command::from_key(command.key()), Some(command));
        }
    }

    #[test]
    fn test_unbound_and_uppercase_keys_ignored() {
        for key in ['W', 'S', 'E', 'q', ' ', '\n', '0', '\u{1b}'] {
            assert_eq!(Command::from_key(key), None, "key {key:?}");
        }
    }
}
