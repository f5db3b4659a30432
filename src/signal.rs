//! Signal handling for graceful shutdown.
//!
//! Ctrl+C sets a shared `AtomicBool` and runs any registered hooks. The CLI
//! registers a hook that cancels the running scan, so an interrupted scan
//! resolves to "cancelled" instead of being killed mid-write.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupsweep::coordinator::ScanCoordinator;
//! use dupsweep::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let coordinator = ScanCoordinator::default();
//!
//! let hook_target = coordinator.clone();
//! handler.on_shutdown(move || {
//!     hook_target.cancel();
//! });
//! ```
//!
//! # Exit Codes
//!
//! After an interrupt the application should exit with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

type Hook = Box<dyn Fn() + Send + Sync>;

/// Centralized shutdown handler for graceful application termination.
///
/// Clones share the flag and the hook list.
#[derive(Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    hooks: Arc<Mutex<Vec<Hook>>>,
}

impl std::fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hooks = self.hooks.lock().map(|h| h.len()).unwrap_or(0);
        f.debug_struct("ShutdownHandler")
            .field("flag", &self.flag)
            .field("hooks", &hooks)
            .finish()
    }
}

impl ShutdownHandler {
    /// Create a new shutdown handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            hooks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag and run every registered hook.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Ok(hooks) = self.hooks.lock() {
            for hook in hooks.iter() {
                hook();
            }
        }
    }

    /// Run `hook` whenever shutdown is requested.
    pub fn on_shutdown(&self, hook: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.push(Box::new(hook));
        }
    }

    /// Get a clone of the shutdown flag for passing to worker threads.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag and drop all hooks.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.clear();
        }
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler that requests shutdown on interrupt.
///
/// The process-wide handler is installed once; later calls reset and return
/// it, so `run_app` can be called repeatedly (as tests do).
///
/// # Errors
///
/// Returns `SignalError` if no handler is installed yet and ctrlc refuses
/// to install one.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
    let hooked = handler.clone();

    match ctrlc::set_handler(move || {
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
        hooked.request_shutdown();
    }) {
        Ok(()) => Ok(handler),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using existing handler");
            Ok(handler)
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}

/// Create a handler without installing any signal hooks.
///
/// ```
/// use dupsweep::signal::create_handler;
/// let handler = create_handler();
/// assert!(!handler.is_shutdown_requested());
/// ```
#[must_use]
pub fn create_handler() -> ShutdownHandler {
    ShutdownHandler::new()
}
