//! Operator key sources.
//!
//! The control loop pulls one character at a time from a [`KeySource`].
//! [`TerminalKeys`] reads the controlling terminal with canonical mode and
//! echo switched off; [`ScriptedKeys`] replays a fixed sequence.

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, poll};
use nix::sys::termios::{LocalFlags, SetArg, SpecialCharacterIndices, Termios, tcgetattr, tcsetattr};
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Interval at which a blocked read re-checks the interrupt flag.
const POLL_SLICE_MS: u16 = 100;

/// Blocking source of operator keystrokes.
pub trait KeySource {
    /// Next keystroke, or `Ok(None)` once input has ended.
    fn next_key(&mut self) -> io::Result<Option<char>>;
}

// ─── Scripted ───────────────────────────────────────────────────────

/// Replays a fixed key sequence, then reports end of input.
#[derive(Debug, Clone)]
pub struct ScriptedKeys<I> {
    keys: I,
}

impl<I: Iterator<Item = char>> ScriptedKeys<I> {
    /// Wrap any character iterator.
    pub fn new(keys: I) -> Self {
        Self { keys }
    }
}

impl<'a> ScriptedKeys<std::str::Chars<'a>> {
    /// Replay the characters of `keys`.
    pub fn from_keys(keys: &'a str) -> Self {
        Self::new(keys.chars())
    }
}

impl<I: Iterator<Item = char>> KeySource for ScriptedKeys<I> {
    fn next_key(&mut self) -> io::Result<Option<char>> {
        Ok(self.keys.next())
    }
}

// ─── Terminal ───────────────────────────────────────────────────────

/// Puts a terminal into character-at-a-time mode and restores it on drop.
///
/// Only `ICANON` and `ECHO` are cleared. `ISIG` stays on so Ctrl-C still
/// raises SIGINT, and output processing is untouched.
pub struct RawModeGuard {
    fd: OwnedFd,
    saved: Termios,
}

impl RawModeGuard {
    /// Switch the terminal behind `fd` to non-canonical, no-echo mode.
    ///
    /// # Errors
    /// Fails if `fd` is not a terminal or its attributes cannot be set.
    pub fn enable(fd: OwnedFd) -> io::Result<Self> {
        let saved = tcgetattr(&fd)?;
        let mut raw = saved.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(&fd, SetArg::TCSADRAIN, &raw)?;
        debug!("Terminal switched to raw key mode");
        Ok(Self { fd, saved })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        match tcsetattr(&self.fd, SetArg::TCSADRAIN, &self.saved) {
            Ok(()) => debug!("Terminal mode restored"),
            Err(e) => warn!("Failed to restore terminal mode: {}", e),
        }
    }
}

/// Keystrokes from standard input.
///
/// When stdin is a terminal it is switched to raw key mode for the
/// lifetime of this value. A set interrupt flag, or end of file, ends
/// input.
pub struct TerminalKeys {
    input: File,
    interrupt: Arc<AtomicBool>,
    _guard: Option<RawModeGuard>,
}

impl TerminalKeys {
    /// Open stdin for unbuffered key reads.
    ///
    /// # Errors
    /// Fails if stdin cannot be duplicated or the terminal mode cannot be
    /// changed.
    pub fn new(interrupt: Arc<AtomicBool>) -> io::Result<Self> {
        Self::from_fd(io::stdin().as_fd().try_clone_to_owned()?, interrupt)
    }

    /// Read keys from `fd`, switching it to raw key mode if it is a terminal.
    ///
    /// # Errors
    /// Fails if the terminal mode cannot be changed.
    pub fn from_fd(fd: OwnedFd, interrupt: Arc<AtomicBool>) -> io::Result<Self> {
        let guard = if fd.is_terminal() {
            Some(RawModeGuard::enable(fd.try_clone()?)?)
        } else {
            info!("Key input is not a terminal; reading without raw mode");
            None
        };

        Ok(Self {
            input: File::from(fd),
            interrupt,
            _guard: guard,
        })
    }

    fn wait_readable(&self) -> io::Result<bool> {
        let mut fds = [PollFd::new(self.input.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, POLL_SLICE_MS) {
            Ok(0) | Err(Errno::EINTR) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<char>> {
        let mut byte = [0u8; 1];
        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                debug!("Interrupt received, ending key input");
                return Ok(None);
            }
            if !self.wait_readable()? {
                continue;
            }
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(char::from(byte[0]))),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
