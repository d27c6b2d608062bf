//! Capture worker lifecycle and storage behaviour.

use super::support::{FakeCamera, wait_until};
use rover_common::camera::CaptureError;
use rover_control::LifecycleFlag;
use rover_control::capture::{CaptureState, CaptureWorker, FrameStore};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

const PREFIX: &str = "captured_image";

fn worker(camera: FakeCamera, dir: &Path, period_ms: u64, flag: &LifecycleFlag) -> CaptureWorker {
    CaptureWorker::new(
        camera.boxed(),
        FrameStore::new(dir, PREFIX),
        Duration::from_millis(period_ms),
        flag.clone(),
    )
}

#[test]
fn test_absent_frames_write_nothing_and_worker_stops_promptly() {
    let tmp = tempfile::tempdir().unwrap();
    let flag = LifecycleFlag::new();
    let camera = FakeCamera::absent();
    let log = camera.log();
    let period = 50;

    let mut worker = worker(camera, tmp.path(), period, &flag);
    worker.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || log.lock().reads >= 5));

    let stopped = Instant::now();
    flag.stop();
    let outcome = worker.join().unwrap();
    assert!(stopped.elapsed() < Duration::from_millis(period * 4));

    assert_eq!(outcome.stats.frames_written, 0);
    assert!(outcome.stats.frames_missing >= 5);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_at_most_one_attempt_after_stop() {
    let tmp = tempfile::tempdir().unwrap();
    let flag = LifecycleFlag::new();
    let camera = FakeCamera::absent().watching(&flag);
    let log = camera.log();

    let mut worker = worker(camera, tmp.path(), 1, &flag);
    worker.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || log.lock().reads >= 10));
    flag.stop();
    worker.join().unwrap();

    assert!(log.lock().reads_after_stop <= 1);
}

#[test]
fn test_frames_saved_with_timestamp_names() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("captured_images");
    let flag = LifecycleFlag::new();

    let mut worker = worker(FakeCamera::jpeg(), &dir, 10, &flag);
    worker.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        fs::read_dir(&dir).map(|d| d.count() > 0).unwrap_or(false)
    }));
    flag.stop();
    let outcome = worker.join().unwrap();
    assert!(outcome.stats.frames_written >= 1);

    for entry in fs::read_dir(&dir).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().into_string().unwrap();
        // captured_image_YYYYMMDD_HHMMSS.jpg
        let label = name
            .strip_prefix("captured_image_")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap_or_else(|| panic!("unexpected file {name}"));
        assert_eq!(label.len(), 15, "{name}");
        assert_eq!(label.as_bytes()[8], b'_', "{name}");
        assert!(
            label.chars().enumerate().all(|(i, c)| i == 8 || c.is_ascii_digit()),
            "{name}"
        );
        assert_eq!(fs::read(entry.path()).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }
}

#[test]
fn test_write_failures_do_not_stop_worker() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the directory should be.
    let blocked = tmp.path().join("not_a_dir");
    fs::write(&blocked, b"").unwrap();
    let flag = LifecycleFlag::new();
    let camera = FakeCamera::jpeg();
    let log = camera.log();

    let mut worker = worker(camera, &blocked, 1, &flag);
    worker.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || log.lock().reads >= 3));
    assert_eq!(worker.state(), CaptureState::Running);
    flag.stop();

    let outcome = worker.join().unwrap();
    assert!(outcome.stats.write_failures >= 3);
    assert_eq!(outcome.stats.frames_written, 0);
}

#[test]
fn test_state_transitions_and_single_start() {
    let tmp = tempfile::tempdir().unwrap();
    let flag = LifecycleFlag::new();
    let mut worker = worker(FakeCamera::absent(), tmp.path(), 5, &flag);

    assert_eq!(worker.state(), CaptureState::Idle);
    worker.start().unwrap();
    assert_eq!(worker.state(), CaptureState::Running);
    assert!(matches!(worker.start(), Err(CaptureError::Worker(_))));

    flag.stop();
    assert!(wait_until(Duration::from_secs(5), || {
        worker.state() == CaptureState::Stopped
    }));
    let outcome = worker.join().unwrap();
    assert_eq!(outcome.device.name(), "fake");
}

#[test]
fn test_join_without_start_returns_device() {
    let tmp = tempfile::tempdir().unwrap();
    let flag = LifecycleFlag::new();
    let camera = FakeCamera::absent();
    let log = camera.log();

    let worker = worker(camera, tmp.path(), 5, &flag);
    let mut outcome = worker.join().unwrap();

    assert_eq!(outcome.stats.attempts, 0);
    assert_eq!(log.lock().reads, 0);
    outcome.device.release().unwrap();
    assert_eq!(log.lock().releases, 1);
}
