//! Scan coordination: one scan at a time, off the caller's thread.
//!
//! [`ScanCoordinator`] wraps a [`DuplicateFinder`] and runs it on tokio's
//! blocking pool, so an async caller never stalls while a tree is walked
//! and hashed. Hashing itself runs on the finder's bounded rayon pool.
//!
//! A coordinator allows one scan in flight. Starting another while one runs
//! fails with [`CoordinatorError::Busy`]. [`ScanCoordinator::cancel`] stops
//! the running scan, which then resolves to [`CoordinatorError::Cancelled`]
//! and never to a partial result.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::coordinator::ScanCoordinator;
//! use dupsweep::duplicates::ScanMode;
//!
//! # async fn run() -> Result<(), dupsweep::coordinator::CoordinatorError> {
//! let coordinator = ScanCoordinator::default();
//! let groups = coordinator.scan("/home/user/Pictures", ScanMode::Strict).await?;
//! for group in &groups {
//!     println!("{}", group);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, FinderError, ScanMode, ScanSummary};
use crate::progress::ProgressCallback;

/// Errors surfaced by the coordinator.
#[derive(thiserror::Error, Debug)]
pub enum CoordinatorError {
    /// Another scan is already running on this coordinator.
    #[error("A scan is already in progress")]
    Busy,

    /// The scan was cancelled before it finished.
    #[error("Scan cancelled")]
    Cancelled,

    /// The scan could not start or failed as a whole.
    #[error(transparent)]
    Scan(FinderError),

    /// The background scan task panicked or was aborted.
    #[error("Scan task failed: {0}")]
    Join(String),
}

impl From<FinderError> for CoordinatorError {
    fn from(err: FinderError) -> Self {
        match err {
            FinderError::Interrupted => Self::Cancelled,
            other => Self::Scan(other),
        }
    }
}

type RunningSlot = Arc<Mutex<Option<Arc<AtomicBool>>>>;

/// Lock the running slot, recovering it if a holder panicked.
fn lock_slot(slot: &RunningSlot) -> MutexGuard<'_, Option<Arc<AtomicBool>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the coordinator busy for as long as it lives.
struct RunGuard {
    slot: RunningSlot,
    cancel: Arc<AtomicBool>,
}

impl RunGuard {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // Recover from poisoning; the slot must always be released.
        *lock_slot(&self.slot) = None;
    }
}

/// Runs duplicate scans, one at a time.
///
/// Cloning yields another handle to the same coordinator: clones share the
/// busy state and `cancel` on any of them stops the running scan.
#[derive(Clone)]
pub struct ScanCoordinator {
    config: FinderConfig,
    running: RunningSlot,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Default for ScanCoordinator {
    fn default() -> Self {
        Self::new(FinderConfig::default())
    }
}

impl ScanCoordinator {
    /// Create a coordinator that scans with `config`.
    ///
    /// Any shutdown flag in `config` is replaced per scan by the
    /// coordinator's own cancel flag.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Report scan progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Whether a scan is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock_slot(&self.running).is_some()
    }

    /// Cancel the running scan, if any. Returns whether a scan was running.
    ///
    /// No new files are hashed after this call; reads already in progress
    /// may finish.
    pub fn cancel(&self) -> bool {
        match lock_slot(&self.running).as_ref() {
            Some(flag) => {
                log::info!("Cancelling running scan");
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    fn begin(&self) -> Result<RunGuard, CoordinatorError> {
        let mut slot = lock_slot(&self.running);
        if slot.is_some() {
            log::debug!("Rejecting scan request: another scan is running");
            return Err(CoordinatorError::Busy);
        }
        let cancel = Arc::new(AtomicBool::new(false));
        *slot = Some(Arc::clone(&cancel));
        Ok(RunGuard {
            slot: Arc::clone(&self.running),
            cancel,
        })
    }

    fn run(
        guard: &RunGuard,
        finder: &DuplicateFinder,
        root: &Path,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), CoordinatorError> {
        let result = finder.find_duplicates(root, mode);
        if guard.is_cancelled() {
            return Err(CoordinatorError::Cancelled);
        }
        Ok(result?)
    }

    fn finder_for(&self, guard: &RunGuard) -> DuplicateFinder {
        let config = self
            .config
            .clone()
            .with_shutdown_flag(Arc::clone(&guard.cancel));
        DuplicateFinder::new(config)
    }

    /// Scan `root` and return its duplicate groups.
    ///
    /// # Errors
    ///
    /// `Busy` if a scan is already running, `Cancelled` if [`cancel`](Self::cancel)
    /// was called, `Scan` if the root is missing, not a directory, or
    /// unreadable.
    pub async fn scan(
        &self,
        root: impl Into<PathBuf>,
        mode: ScanMode,
    ) -> Result<Vec<DuplicateGroup>, CoordinatorError> {
        self.scan_with_summary(root, mode)
            .await
            .map(|(groups, _)| groups)
    }

    /// Scan `root` and return its duplicate groups together with scan statistics.
    ///
    /// # Errors
    ///
    /// Same as [`scan`](Self::scan).
    pub async fn scan_with_summary(
        &self,
        root: impl Into<PathBuf>,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), CoordinatorError> {
        let guard = self.begin()?;
        let finder = self.finder_for(&guard);
        let root = root.into();

        // The guard moves into the task so the coordinator stays busy until
        // the blocking work really ends, even if this future is dropped.
        tokio::task::spawn_blocking(move || Self::run(&guard, &finder, &root, mode))
            .await
            .map_err(|e| CoordinatorError::Join(e.to_string()))?
    }

    /// Scan on the current thread.
    ///
    /// # Errors
    ///
    /// Same as [`scan`](Self::scan).
    pub fn scan_blocking(
        &self,
        root: &Path,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), CoordinatorError> {
        let guard = self.begin()?;
        let finder = self.finder_for(&guard);
        Self::run(&guard, &finder, root, mode)
    }
}
