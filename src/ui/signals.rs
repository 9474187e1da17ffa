use crate::error::{ConvertError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ctrl+C handling shared between the batch runner and the facade.
/// The first signal lets the current document finish; a second one exits.
#[derive(Clone)]
pub struct GracefulShutdown {
    running: Arc<AtomicBool>,
    interrupt_seen: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::new_for_test();

        let running = shutdown.running.clone();
        let interrupt_seen = shutdown.interrupt_seen.clone();

        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);

            if !interrupt_seen.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Finishing the current report... (press Ctrl+C again to abort)");
            } else {
                eprintln!("\n💀 Aborting");
                std::process::exit(130);
            }
        })
        .map_err(|e| ConvertError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(shutdown)
    }

    /// An instance without a signal handler. `ctrlc` allows one handler per
    /// process, so tests build these instead.
    pub fn new_for_test() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            interrupt_seen: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(ConvertError::Cancelled);
        }
        Ok(())
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::new_for_test())
    }
}
