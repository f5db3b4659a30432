use dupsweep::coordinator::{CoordinatorError, ScanCoordinator};
use dupsweep::duplicates::ScanMode;
use dupsweep::progress::ProgressCallback;
use dupsweep::service::DedupService;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, OnceLock};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc as async_mpsc;

/// Holds the scan at the start of the walking phase until released.
struct Gate {
    started: async_mpsc::UnboundedSender<()>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ProgressCallback for Gate {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if phase != "walking" {
            return;
        }
        let _ = self.started.send(());
        if let Ok(release) = self.release.lock() {
            let _ = release.recv_timeout(Duration::from_secs(10));
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

fn gated() -> (Arc<Gate>, async_mpsc::UnboundedReceiver<()>, mpsc::Sender<()>) {
    let (started_tx, started_rx) = async_mpsc::unbounded_channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate {
        started: started_tx,
        release: Mutex::new(release_rx),
    });
    (gate, started_rx, release_tx)
}

fn populate(root: &Path) {
    fs::write(root.join("a.txt"), b"hi").unwrap();
    fs::write(root.join("b.txt"), b"hi").unwrap();
    fs::write(root.join("c.txt"), b"bye").unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_scan_rejected_while_running() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let (gate, mut started, release) = gated();
    let coordinator = ScanCoordinator::default().with_progress_callback(gate);

    let runner = coordinator.clone();
    let root = dir.path().to_path_buf();
    let first = tokio::spawn(async move { runner.scan(root, ScanMode::Strict).await });

    started.recv().await.unwrap();
    assert!(coordinator.is_running());

    let second = coordinator
        .scan(dir.path().to_path_buf(), ScanMode::SizeOnly)
        .await;
    assert!(matches!(second, Err(CoordinatorError::Busy)));

    release.send(()).unwrap();
    let groups = first.await.unwrap().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2);
    assert!(!coordinator.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_resolves_to_cancelled() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let (gate, mut started, release) = gated();
    let coordinator = ScanCoordinator::default().with_progress_callback(gate);

    let runner = coordinator.clone();
    let root = dir.path().to_path_buf();
    let scan = tokio::spawn(async move { runner.scan(root, ScanMode::Strict).await });

    started.recv().await.unwrap();
    assert!(coordinator.cancel());
    release.send(()).unwrap();

    let result = scan.await.unwrap();
    assert!(matches!(result, Err(CoordinatorError::Cancelled)));
    assert!(!coordinator.is_running());
    assert!(!coordinator.cancel());
}

/// Cancels its coordinator as soon as hashing begins.
#[derive(Default)]
struct CancelOnHash {
    coordinator: OnceLock<ScanCoordinator>,
    cancelled: AtomicBool,
}

impl ProgressCallback for CancelOnHash {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if phase != "hashing" {
            return;
        }
        if let Some(coordinator) = self.coordinator.get() {
            self.cancelled.store(coordinator.cancel(), Ordering::SeqCst);
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_hashing_resolves_to_cancelled() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let hook = Arc::new(CancelOnHash::default());
    let coordinator = ScanCoordinator::default().with_progress_callback(hook.clone());
    assert!(hook.coordinator.set(coordinator.clone()).is_ok());

    let result = coordinator
        .scan(dir.path().to_path_buf(), ScanMode::Strict)
        .await;

    assert!(hook.cancelled.load(Ordering::SeqCst));
    assert!(matches!(result, Err(CoordinatorError::Cancelled)));
    assert!(!coordinator.is_running());

    // Size-only scans never hash, so the next one runs to completion
    let again = coordinator
        .scan(dir.path().to_path_buf(), ScanMode::SizeOnly)
        .await
        .unwrap();
    assert_eq!(again.len(), 1);
}

#[tokio::test]
async fn test_coordinator_reusable_after_cancel() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let coordinator = ScanCoordinator::default();
    assert!(!coordinator.cancel());

    let groups = coordinator
        .scan(dir.path().to_path_buf(), ScanMode::SizeOnly)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].digest_key(), "size_2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_scan_rejected_while_busy() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let (gate, mut started, release) = gated();
    let coordinator = ScanCoordinator::default().with_progress_callback(gate);
    let service = Arc::new(DedupService::new(coordinator));

    let runner = Arc::clone(&service);
    let root = dir.path().to_string_lossy().into_owned();
    let first = tokio::spawn(async move { runner.scan_folder(root, ScanMode::Strict).await });

    started.recv().await.unwrap();
    let err = service
        .scan_folder(dir.path().to_string_lossy().into_owned(), ScanMode::Strict)
        .await
        .unwrap_err();
    assert!(err.contains("already in progress"));

    release.send(()).unwrap();
    let groups = first.await.unwrap().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}
