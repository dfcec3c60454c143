//! Interrupt handling while the CLI waits on a clipboard worker

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal for commands that block until the clipboard is superseded.
///
/// SIGINT and SIGTERM only set a flag. The handlers are installed without
/// `SA_RESTART`, so a blocking wait returns early and the caller exits
/// normally, which runs the worker exit hook.
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        SHUTDOWN.load(Ordering::SeqCst)
    }

    /// Setup signal handler
    #[cfg(unix)]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

        extern "C" fn on_shutdown(_signal: std::ffi::c_int) {
            SHUTDOWN.store(true, Ordering::SeqCst);
        }

        let action = SigAction::new(
            SigHandler::Handler(on_shutdown),
            SaFlags::empty(),
            SigSet::empty(),
        );
        // SAFETY: the handler only stores to an atomic
        unsafe {
            sigaction(Signal::SIGINT, &action)?;
            sigaction(Signal::SIGTERM, &action)?;
        }
        Ok(())
    }

    /// Setup signal handler
    #[cfg(not(unix))]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_signal_default_is_false() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
    }
}
