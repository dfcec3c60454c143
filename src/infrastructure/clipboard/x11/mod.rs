//! X11 clipboard backend
//!
//! Reads are one-shot selection conversions. Writes first offer the content
//! to a clipboard manager and otherwise hand it to a forked worker process
//! that keeps owning CLIPBOARD after the call returns.

mod atoms;
mod charset;
mod display;
mod handler;
mod manager;
mod pipe;
mod reader;
mod supervisor;
mod worker;

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

pub use atoms::Atoms;
pub use charset::{locale_codeset, ConversionError, LocaleConverter};
pub use handler::{SelectionReply, SelectionRequestHandler};
pub use manager::{hand_off_to_manager, HandoffError};
pub use pipe::{encode_frame, FrameError, FrameReader, FrameWriter};
pub use reader::read_selection;
pub use supervisor::{ForkLauncher, Supervisor, WaitOutcome, WorkerHandle, WorkerLauncher};

use crate::application::ports::{Clipboard, ClipboardError, Delivery};
use crate::domain::config::ClipboardSettings;
use crate::domain::content::ClipboardContent;

impl From<ConnectError> for ClipboardError {
    fn from(err: ConnectError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

impl From<ConnectionError> for ClipboardError {
    fn from(err: ConnectionError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

impl From<ReplyError> for ClipboardError {
    fn from(err: ReplyError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

impl From<ReplyOrIdError> for ClipboardError {
    fn from(err: ReplyOrIdError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}

type ForkSupervisor = Supervisor<ForkLauncher>;

/// The process-wide supervisor; at most one worker per process
static SERVICE: OnceLock<Mutex<ForkSupervisor>> = OnceLock::new();

fn service(settings: &ClipboardSettings) -> MutexGuard<'static, ForkSupervisor> {
    SERVICE
        .get_or_init(|| {
            let launcher = ForkLauncher::new(settings.clone(), stop_worker_at_exit);
            Mutex::new(Supervisor::new(launcher, settings.max_spawn_retries))
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Exit hook: stop the worker unless a write is still in progress
extern "C" fn stop_worker_at_exit() {
    let Some(service) = SERVICE.get() else {
        return;
    };
    match service.try_lock() {
        Ok(mut supervisor) => supervisor.shutdown(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().shutdown(),
        Err(TryLockError::WouldBlock) => {}
    }
}

/// The process-wide worker serves a single display; refuse writes aimed elsewhere
fn ensure_same_display(
    serving: &ClipboardSettings,
    requested: &ClipboardSettings,
) -> Result<(), ClipboardError> {
    if serving.display == requested.display {
        return Ok(());
    }
    let name = |settings: &ClipboardSettings| {
        settings
            .display
            .clone()
            .unwrap_or_else(|| "$DISPLAY".to_string())
    };
    Err(ClipboardError::ProcessError(format!(
        "this process already serves the clipboard of {}, cannot write to {}",
        name(serving),
        name(requested)
    )))
}

/// Clipboard adapter for X11 displays
#[derive(Debug, Clone, Default)]
pub struct X11Clipboard {
    settings: ClipboardSettings,
}

impl X11Clipboard {
    pub fn new(settings: ClipboardSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClipboardSettings {
        &self.settings
    }
}

impl Clipboard for X11Clipboard {
    fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        read_selection(&self.settings)
    }

    fn write(&self, content: &ClipboardContent) -> Result<Delivery, ClipboardError> {
        // Fail in the caller rather than in a worker that can never connect
        display::probe(&self.settings)?;
        let mut supervisor = service(&self.settings);
        ensure_same_display(supervisor.launcher().settings(), &self.settings)?;
        supervisor.ensure_worker_and_send(content)
    }

    fn hold(&self) -> Result<(), ClipboardError> {
        match service(&self.settings).hold()? {
            WaitOutcome::Exited => tracing::debug!("worker no longer owns CLIPBOARD"),
            WaitOutcome::Interrupted => tracing::debug!("stopped waiting on worker"),
        }
        Ok(())
    }

    fn detach(&self) -> Result<(), ClipboardError> {
        service(&self.settings).detach();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_display_is_accepted() {
        let settings = ClipboardSettings::with_display(":1");
        assert!(ensure_same_display(&settings, &settings.clone()).is_ok());
        assert!(
            ensure_same_display(&ClipboardSettings::default(), &ClipboardSettings::default())
                .is_ok()
        );
    }

    #[test]
    fn other_display_is_rejected() {
        let err = ensure_same_display(
            &ClipboardSettings::with_display(":1"),
            &ClipboardSettings::with_display(":2"),
        )
        .unwrap_err();
        match err {
            ClipboardError::ProcessError(message) => {
                assert!(message.contains(":1"));
                assert!(message.contains(":2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_display_differs_from_named_one() {
        assert!(ensure_same_display(
            &ClipboardSettings::default(),
            &ClipboardSettings::with_display(":0"),
        )
        .is_err());
    }
}
