//! Background capture thread with an explicit start/join contract.

use super::store::{CaptureRecord, FrameStore};
use crate::lifecycle::LifecycleFlag;
use rover_common::camera::{CaptureDevice, CaptureError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Worker lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaptureState {
    /// Constructed, thread not spawned.
    Idle = 0,
    /// Thread capturing.
    Running = 1,
    /// Thread has left its loop, or the worker was joined without starting.
    Stopped = 2,
}

impl CaptureState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CaptureState::Idle,
            1 => CaptureState::Running,
            _ => CaptureState::Stopped,
        }
    }
}

/// Per-run counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    /// `read_frame()` calls.
    pub attempts: u64,
    /// Frames written to storage.
    pub frames_written: u64,
    /// Attempts that yielded no frame.
    pub frames_missing: u64,
    /// Frames that could not be written.
    pub write_failures: u64,
}

/// What `join()` hands back: the device, ready for release, and counters.
pub struct CaptureOutcome {
    /// The capture device, no longer used by any thread.
    pub device: Box<dyn CaptureDevice>,
    /// Counters for the run.
    pub stats: CaptureStats,
}

impl std::fmt::Debug for CaptureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOutcome")
            .field("device", &self.device.name())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Supervised capture thread.
///
/// The device lives in the worker until `start()`, moves into the thread,
/// and comes back out of `join()`. Nothing else can touch it meanwhile.
pub struct CaptureWorker {
    state: Arc<AtomicU8>,
    flag: LifecycleFlag,
    store: FrameStore,
    period: Duration,
    device: Option<Box<dyn CaptureDevice>>,
    handle: Option<JoinHandle<CaptureOutcome>>,
}

impl CaptureWorker {
    /// Create an idle worker around `device`.
    pub fn new(
        device: Box<dyn CaptureDevice>,
        store: FrameStore,
        period: Duration,
        flag: LifecycleFlag,
    ) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(CaptureState::Idle as u8)),
            flag,
            store,
            period,
            device: Some(device),
            handle: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CaptureState {
        CaptureState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Spawn the capture thread.
    ///
    /// # Errors
    /// `CaptureError::Worker` if the worker is not idle or the thread
    /// cannot be spawned.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state() != CaptureState::Idle {
            return Err(CaptureError::Worker(format!(
                "start called in state {:?}",
                self.state()
            )));
        }
        let device = self
            .device
            .take()
            .ok_or_else(|| CaptureError::Worker("capture device missing".to_string()))?;

        let state = Arc::clone(&self.state);
        let flag = self.flag.clone();
        let store = self.store.clone();
        let period = self.period;

        self.state
            .store(CaptureState::Running as u8, Ordering::SeqCst);

        // The closure owns the device; on spawn failure it is dropped with it.
        let spawned = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || capture_loop(device, &store, period, &flag, &state));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                info!(
                    "Capture worker started (period {} ms, dir {})",
                    self.period.as_millis(),
                    self.store.dir().display()
                );
                Ok(())
            }
            Err(e) => {
                self.state
                    .store(CaptureState::Stopped as u8, Ordering::SeqCst);
                Err(CaptureError::Worker(format!("failed to spawn capture thread: {e}")))
            }
        }
    }

    /// Wait for the thread to finish and take the device back.
    ///
    /// The caller must have stopped the lifecycle flag first, otherwise
    /// this blocks for as long as the worker keeps running. An idle worker
    /// returns its device immediately.
    ///
    /// # Errors
    /// `CaptureError::Worker` if the thread panicked or the device was lost
    /// with a failed spawn.
    pub fn join(mut self) -> Result<CaptureOutcome, CaptureError> {
        let outcome = match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CaptureError::Worker("capture thread panicked".to_string())),
            None => self
                .device
                .take()
                .map(|device| CaptureOutcome {
                    device,
                    stats: CaptureStats::default(),
                })
                .ok_or_else(|| CaptureError::Worker("capture device lost".to_string())),
        };
        self.state
            .store(CaptureState::Stopped as u8, Ordering::SeqCst);
        outcome
    }
}

fn capture_loop(
    mut device: Box<dyn CaptureDevice>,
    store: &FrameStore,
    period: Duration,
    flag: &LifecycleFlag,
    state: &AtomicU8,
) -> CaptureOutcome {
    if let Err(e) = store.ensure_dir() {
        warn!(
            "Cannot create capture directory {}: {}",
            store.dir().display(),
            e
        );
    }

    let mut stats = CaptureStats::default();
    while flag.is_running() {
        stats.attempts += 1;
        match device.read_frame() {
            Ok(frame) => {
                let record = CaptureRecord::now(frame);
                match store.write(&record) {
                    Ok(path) => {
                        stats.frames_written += 1;
                        info!("Image saved to {}", path.display());
                    }
                    Err(e) => {
                        stats.write_failures += 1;
                        warn!("{}", e);
                    }
                }
            }
            Err(CaptureError::FrameUnavailable(reason)) => {
                stats.frames_missing += 1;
                debug!("No frame from {}, skipping: {}", device.name(), reason);
            }
            Err(e) => {
                stats.frames_missing += 1;
                warn!("Capture from {} failed, skipping: {}", device.name(), e);
            }
        }
        thread::sleep(period);
    }

    state.store(CaptureState::Stopped as u8, Ordering::SeqCst);
    info!(
        "Capture worker stopped: {} attempts, {} saved, {} missing, {} write failures",
        stats.attempts, stats.frames_written, stats.frames_missing, stats.write_failures
    );
    CaptureOutcome { device, stats }
}
