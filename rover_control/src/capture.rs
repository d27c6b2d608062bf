//! Periodic still capture.
//!
//! The worker thread owns the capture device, grabs one frame per period
//! and hands each frame to the store. It stops cooperatively when the
//! lifecycle flag is cleared and gives the device back on join.

pub mod store;
pub mod worker;

pub use store::{CaptureRecord, FrameStore, timestamp_label};
pub use worker::{CaptureOutcome, CaptureState, CaptureStats, CaptureWorker};
