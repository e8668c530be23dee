//! Ctrl+C handling.
//!
//! The handler sets a shared `AtomicBool` that the batch checks before
//! starting each input; inputs already being written are allowed to finish so
//! no file is left half-written. The handler also resets the terminal color
//! in case a colored record was interrupted mid-line.
//!
//! # Usage
//!
//! ```rust,no_run
//! use itemdedup::signal::install_handler;
//!
//! let handler = install_handler();
//! let flag = handler.get_flag();
//! // Batch::new(..).with_shutdown_flag(flag)
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// ANSI reset sequence written on interrupt.
const RESET_COLOR: &str = "\x1b[0m";

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the batch.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook, or reuse the installed one.
///
/// `ctrlc` accepts one hook per process; repeated calls (several in-process
/// runs, parallel tests) get the same handler back with its flag cleared. If
/// the hook cannot be registered at all, an unhooked handler is returned and
/// the run proceeds without interrupt support.
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        let hooked = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{RESET_COLOR}");
            let _ = stdout.flush();
            let _ = writeln!(std::io::stderr(), "\nInterrupted, finishing inputs in progress...");
        });
        if let Err(err) = hooked {
            log::debug!("Ctrl+C handler not installed: {}", err);
        }
        handler
    });
    handler.reset();
    handler.clone()
}
