//! Ctrl-C handling while commands run.
//!
//! A process-wide SIGINT handler only raises a flag. Sessions read and clear
//! that flag around each command, so an interrupt stops the running command
//! instead of the whole program.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static SIGINT: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));
static INSTALLED: Mutex<bool> = Mutex::new(false);

/// Install the SIGINT handler once and return the flag it raises.
///
/// Later calls return the same flag without touching the handler.
pub fn install() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
    if !*installed {
        let flag = Arc::clone(&SIGINT);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
        *installed = true;
        log::debug!("SIGINT handler installed");
    }
    Ok(Arc::clone(&SIGINT))
}

/// Interrupt flag owned by one session and shared with its nested sessions.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub(crate) fn from_shared(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    /// Mark the running command as interrupted.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag, returning whether it was raised.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn is_process_flag(&self) -> bool {
        Arc::ptr_eq(&self.0, &SIGINT)
    }
}
