//! Background owner worker
//!
//! Runs inside the forked child. Owns CLIPBOARD on its own display
//! connection and answers requests until another client takes the selection
//! over or the supervisor asks it to stop with SIGINT.

use std::ffi::c_int;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicI32, Ordering};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::pipe;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, EventMask, Window};
use x11rb::protocol::Event;
use x11rb::CURRENT_TIME;

use super::charset::LocaleConverter;
use super::display::Display;
use super::handler::SelectionRequestHandler;
use super::pipe::{set_nonblocking, FrameReader};
use crate::application::ports::ClipboardError;
use crate::domain::config::ClipboardSettings;
use crate::domain::content::ClipboardContent;
use crate::domain::selection::SelectionOwnership;
use crate::domain::worker::{WorkerExit, WorkerLifecycle};

/// Write end of the shutdown self-pipe, read by the signal handler
static SHUTDOWN_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn request_shutdown(_signal: c_int) {
    let fd = SHUTDOWN_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        // SAFETY: write(2) is async-signal-safe; a full pipe already signals
        unsafe {
            nix::libc::write(fd, b"x".as_ptr().cast(), 1);
        }
    }
}

/// Self-pipe that turns SIGINT/SIGTERM into a readable descriptor
struct ShutdownPipe {
    reader: File,
    _writer: OwnedFd,
}

impl ShutdownPipe {
    fn install() -> nix::Result<Self> {
        let (read_end, write_end) = pipe()?;
        set_nonblocking(&read_end)?;
        set_nonblocking(&write_end)?;
        SHUTDOWN_FD.store(write_end.as_raw_fd(), Ordering::SeqCst);

        let action = SigAction::new(
            SigHandler::Handler(request_shutdown),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler only loads an atomic and calls write(2)
        unsafe {
            sigaction(Signal::SIGINT, &action)?;
            sigaction(Signal::SIGTERM, &action)?;
        }

        Ok(Self {
            reader: File::from(read_end),
            _writer: write_end,
        })
    }

    /// Consume pending wakeups; true when shutdown was requested
    fn take(&mut self) -> bool {
        let mut buf = [0u8; 16];
        let mut requested = false;
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return requested,
                Ok(_) => requested = true,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return requested,
            }
        }
    }
}

impl Drop for ShutdownPipe {
    fn drop(&mut self) {
        SHUTDOWN_FD.store(-1, Ordering::SeqCst);
        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: restoring the default disposition
        unsafe {
            let _ = sigaction(Signal::SIGINT, &default);
            let _ = sigaction(Signal::SIGTERM, &default);
        }
    }
}

/// Serve CLIPBOARD until superseded or stopped, returning the exit status
pub fn run(frames: FrameReader, settings: &ClipboardSettings) -> WorkerExit {
    let display = match Display::open(settings) {
        Ok(display) => display,
        Err(e) => {
            tracing::warn!(error = %e, "worker could not open display");
            return WorkerExit::AcquireFailed;
        }
    };

    let mut worker = match OwnerWorker::start(display, frames, settings) {
        Ok(worker) => worker,
        Err(e) => {
            tracing::warn!(error = %e, "worker could not acquire CLIPBOARD");
            return WorkerExit::AcquireFailed;
        }
    };

    let exit = worker.serve();
    tracing::info!(pid = std::process::id(), status = exit.code(), "worker exiting");
    exit
}

/// The events the worker reacts to, reduced to what decides its next move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerEvent {
    Request,
    /// SelectionClear; `ours` when it names our window and CLIPBOARD
    Clear { ours: bool },
    /// DestroyNotify; `ours` when it names our window
    Destroyed { ours: bool },
    ShutdownRequested,
    Other,
}

/// What the event loop does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Ignore,
    Answer,
    Teardown,
    Exit(WorkerExit),
}

/// Lifecycle and ownership of one worker, advanced one event at a time
#[derive(Debug)]
struct OwnerState {
    lifecycle: WorkerLifecycle,
    ownership: SelectionOwnership,
}

impl OwnerState {
    /// State right after the server confirmed our window as owner
    fn acquired() -> Result<Self, ClipboardError> {
        let mut lifecycle = WorkerLifecycle::new();
        lifecycle
            .begin_owning()
            .map_err(|e| ClipboardError::ProcessError(e.to_string()))?;
        Ok(Self {
            lifecycle,
            ownership: SelectionOwnership::acquired(),
        })
    }

    fn step(&mut self, event: WorkerEvent) -> Step {
        match event {
            WorkerEvent::Request => Step::Answer,
            WorkerEvent::Clear { ours: false }
            | WorkerEvent::Destroyed { ours: false }
            | WorkerEvent::Other => Step::Ignore,
            WorkerEvent::Clear { ours: true } => {
                if let Err(e) = self.ownership.lose() {
                    tracing::debug!(error = %e, "ignoring repeated SelectionClear");
                    return Step::Ignore;
                }
                tracing::info!("CLIPBOARD taken over by another client");
                self.begin_teardown()
            }
            WorkerEvent::ShutdownRequested => {
                tracing::info!("shutdown requested");
                self.begin_teardown()
            }
            WorkerEvent::Destroyed { ours: true } => {
                if let Err(e) = self.lifecycle.finish() {
                    tracing::debug!(error = %e, "window destroyed outside the lifecycle");
                }
                self.ownership.release();
                Step::Exit(WorkerExit::Clean)
            }
        }
    }

    /// Only the first request to stop destroys the window
    fn begin_teardown(&mut self) -> Step {
        match self.lifecycle.begin_terminating() {
            Ok(()) => Step::Teardown,
            Err(_) => Step::Ignore,
        }
    }
}

/// A window that cannot be destroyed leaves no clean way out
fn teardown_outcome(result: Result<(), ClipboardError>) -> Option<WorkerExit> {
    match result {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "cannot destroy window, exiting immediately");
            Some(WorkerExit::Emergency)
        }
    }
}

struct OwnerWorker {
    display: Display,
    window: Window,
    handler: SelectionRequestHandler,
    frames: FrameReader,
    content: ClipboardContent,
    state: OwnerState,
}

impl OwnerWorker {
    fn start(
        display: Display,
        frames: FrameReader,
        settings: &ClipboardSettings,
    ) -> Result<Self, ClipboardError> {
        let window = display.create_hidden_window(EventMask::STRUCTURE_NOTIFY)?;
        let clipboard = display.atoms.CLIPBOARD;

        display
            .conn
            .set_selection_owner(window, clipboard, CURRENT_TIME)?;
        let owner = display.conn.get_selection_owner(clipboard)?.reply()?.owner;
        if owner != window {
            display.discard_window(window);
            return Err(ClipboardError::ProcessError(
                "another client took CLIPBOARD first".to_string(),
            ));
        }

        let state = OwnerState::acquired()?;
        tracing::info!(pid = std::process::id(), window, "worker owns CLIPBOARD");

        let handler = SelectionRequestHandler::new(
            display.atoms,
            LocaleConverter::from_environment(settings.conversion_chunk),
        );

        Ok(Self {
            display,
            window,
            handler,
            frames,
            content: ClipboardContent::empty(),
            state,
        })
    }

    fn serve(&mut self) -> WorkerExit {
        let mut shutdown = match ShutdownPipe::install() {
            Ok(shutdown) => shutdown,
            Err(e) => {
                tracing::warn!(error = %e, "worker could not install signal handlers");
                self.display.discard_window(self.window);
                return WorkerExit::Emergency;
            }
        };

        loop {
            loop {
                match self.display.conn.poll_for_event() {
                    Ok(Some(event)) => {
                        if let Some(exit) = self.dispatch(event) {
                            return exit;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "display connection lost");
                        return WorkerExit::Emergency;
                    }
                }
            }

            if shutdown.take() && self.state.step(WorkerEvent::ShutdownRequested) == Step::Teardown
            {
                if let Some(exit) = teardown_outcome(self.teardown()) {
                    return exit;
                }
                // Exit follows through DestroyNotify
                continue;
            }

            if let Err(e) = self.wait(&shutdown) {
                tracing::warn!(error = %e, "worker wait failed");
                return WorkerExit::Emergency;
            }
        }
    }

    /// Block until the display socket or the shutdown pipe is readable
    fn wait(&self, shutdown: &ShutdownPipe) -> nix::Result<()> {
        let mut fds = [
            PollFd::new(self.display.conn.stream().as_fd(), PollFlags::POLLIN),
            PollFd::new(shutdown.reader.as_fd(), PollFlags::POLLIN),
        ];
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) | Err(Errno::EINTR) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn classify(&self, event: &Event) -> WorkerEvent {
        match event {
            Event::SelectionRequest(_) => WorkerEvent::Request,
            Event::SelectionClear(clear) => WorkerEvent::Clear {
                ours: clear.owner == self.window
                    && clear.selection == self.display.atoms.CLIPBOARD,
            },
            Event::DestroyNotify(destroyed) => WorkerEvent::Destroyed {
                ours: destroyed.window == self.window,
            },
            _ => WorkerEvent::Other,
        }
    }

    fn dispatch(&mut self, event: Event) -> Option<WorkerExit> {
        let kind = self.classify(&event);
        match self.state.step(kind) {
            Step::Answer => {
                if let Event::SelectionRequest(request) = event {
                    self.refresh_content();
                    if let Err(e) =
                        self.handler.respond(&self.display.conn, &request, &self.content)
                    {
                        tracing::warn!(error = %e, "failed to answer selection request");
                    }
                }
                None
            }
            Step::Teardown => teardown_outcome(self.teardown()),
            Step::Exit(exit) => {
                self.content = ClipboardContent::empty();
                Some(exit)
            }
            Step::Ignore => None,
        }
    }

    fn teardown(&mut self) -> Result<(), ClipboardError> {
        self.display.conn.destroy_window(self.window)?;
        self.display.conn.flush()?;
        Ok(())
    }

    /// Take at most one pending frame; keep the current content if none is ready
    fn refresh_content(&mut self) {
        match self.frames.try_recv() {
            Ok(Some(content)) => {
                tracing::debug!(len = content.len(), "worker received new content");
                self.content = content;
            }
            Ok(None) => {}
            Err(e) => {
                let violation = ClipboardError::ProtocolViolation(e.to_string());
                tracing::warn!(error = %violation, "discarding clipboard content");
                self.content = ClipboardContent::empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nix::sys::signal::raise;

    use crate::domain::selection::OwnershipState;
    use crate::domain::worker::WorkerState;

    fn owning() -> OwnerState {
        OwnerState::acquired().unwrap()
    }

    #[test]
    fn shutdown_pipe_reports_signal_once() {
        let mut shutdown = ShutdownPipe::install().unwrap();
        assert!(!shutdown.take());

        raise(Signal::SIGINT).unwrap();
        assert!(shutdown.take());
        assert!(!shutdown.take());
    }

    #[test]
    fn requests_are_answered_while_owning() {
        let mut state = owning();
        assert_eq!(state.step(WorkerEvent::Request), Step::Answer);
        assert_eq!(state.lifecycle.state(), WorkerState::Owning);
    }

    #[test]
    fn clear_for_another_window_is_ignored() {
        let mut state = owning();
        assert_eq!(state.step(WorkerEvent::Clear { ours: false }), Step::Ignore);
        assert_eq!(state.lifecycle.state(), WorkerState::Owning);
        assert_eq!(state.ownership.state(), OwnershipState::OwnedByThisProcess);
    }

    #[test]
    fn clear_tears_down_once() {
        let mut state = owning();
        assert_eq!(state.step(WorkerEvent::Clear { ours: true }), Step::Teardown);
        assert_eq!(state.lifecycle.state(), WorkerState::Terminating);
        assert_eq!(state.ownership.state(), OwnershipState::Unowned);

        assert_eq!(state.step(WorkerEvent::Clear { ours: true }), Step::Ignore);
        assert_eq!(state.lifecycle.state(), WorkerState::Terminating);
    }

    #[test]
    fn clear_after_shutdown_does_not_tear_down_again() {
        let mut state = owning();
        assert_eq!(state.step(WorkerEvent::ShutdownRequested), Step::Teardown);
        assert_eq!(state.step(WorkerEvent::Clear { ours: true }), Step::Ignore);
        assert_eq!(state.step(WorkerEvent::ShutdownRequested), Step::Ignore);
    }

    #[test]
    fn destroy_of_our_window_exits_clean() {
        let mut state = owning();
        state.step(WorkerEvent::Clear { ours: true });

        assert_eq!(
            state.step(WorkerEvent::Destroyed { ours: true }),
            Step::Exit(WorkerExit::Clean)
        );
        assert_eq!(state.lifecycle.state(), WorkerState::Exited);
        assert_eq!(state.ownership.state(), OwnershipState::Unowned);
    }

    #[test]
    fn destroy_of_other_window_is_ignored() {
        let mut state = owning();
        assert_eq!(state.step(WorkerEvent::Destroyed { ours: false }), Step::Ignore);
        assert_eq!(state.step(WorkerEvent::Other), Step::Ignore);
        assert!(state.lifecycle.is_owning());
    }

    #[test]
    fn failed_teardown_is_an_emergency() {
        assert_eq!(teardown_outcome(Ok(())), None);
        assert_eq!(
            teardown_outcome(Err(ClipboardError::ConnectionFailed("gone".to_string()))),
            Some(WorkerExit::Emergency)
        );
        assert_eq!(WorkerExit::Emergency.code(), 2);
    }
}
