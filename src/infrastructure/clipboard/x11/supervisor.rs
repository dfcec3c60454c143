//! Parent-side lifecycle of the background owner worker

use std::fs::OpenOptions;
use std::os::fd::AsRawFd;

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, fork, pipe, ForkResult, Pid};

use super::manager::{hand_off_to_manager, HandoffError};
use super::pipe::{set_nonblocking, FrameReader, FrameWriter};
use super::worker;
use crate::application::ports::{ClipboardError, Delivery};
use crate::domain::config::ClipboardSettings;
use crate::domain::content::ClipboardContent;

/// A live worker process and the pipe feeding it
#[derive(Debug)]
pub struct WorkerHandle {
    pub pid: Pid,
    pub writer: FrameWriter,
}

/// How a blocking wait on the worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The worker is gone and reaped
    Exited,
    /// A signal interrupted the wait; the worker may still run
    Interrupted,
}

/// Process operations the supervisor depends on
pub trait WorkerLauncher {
    /// Try the clipboard manager fast path
    fn hand_off(&self, content: &ClipboardContent) -> Result<(), HandoffError>;

    /// Start a new worker
    fn spawn(&mut self) -> Result<WorkerHandle, ClipboardError>;

    /// Non-blocking liveness check; reaps the worker when it has exited
    fn is_alive(&self, handle: &WorkerHandle) -> bool;

    /// Ask the worker to stop and reap it
    fn stop(&self, handle: WorkerHandle);

    /// Block until the worker exits
    fn wait(&self, handle: &WorkerHandle) -> Result<WaitOutcome, ClipboardError>;

    /// Arrange for the worker to be stopped at process exit
    fn register_exit_hook(&self) -> Result<(), ClipboardError>;
}

/// Owns at most one worker and delivers content to it.
///
/// Spawn attempts are bounded: a dead or unreachable worker is replaced, but
/// after `max_retries` consecutive replacements the write fails.
pub struct Supervisor<L: WorkerLauncher> {
    launcher: L,
    worker: Option<WorkerHandle>,
    consecutive_failures: u32,
    max_retries: u32,
    exit_hook_registered: bool,
}

impl<L: WorkerLauncher> Supervisor<L> {
    pub fn new(launcher: L, max_retries: u32) -> Self {
        Self {
            launcher,
            worker: None,
            consecutive_failures: 0,
            max_retries,
            exit_hook_registered: false,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    pub fn worker_pid(&self) -> Option<Pid> {
        self.worker.as_ref().map(|handle| handle.pid)
    }

    /// Deliver `content`, via the clipboard manager or a live worker
    pub fn ensure_worker_and_send(
        &mut self,
        content: &ClipboardContent,
    ) -> Result<Delivery, ClipboardError> {
        loop {
            let Some(handle) = self.worker.as_mut() else {
                match self.launcher.hand_off(content) {
                    Ok(()) => {
                        self.consecutive_failures = 0;
                        return Ok(Delivery::ClipboardManager);
                    }
                    Err(e) => tracing::debug!(reason = %e, "no clipboard manager handoff"),
                }

                if self.consecutive_failures > self.max_retries {
                    let attempts = self.consecutive_failures;
                    self.consecutive_failures = 0;
                    return Err(ClipboardError::ProcessError(format!(
                        "worker failed {} times in a row",
                        attempts
                    )));
                }
                self.consecutive_failures += 1;

                match self.launcher.spawn() {
                    Ok(handle) => {
                        self.worker = Some(handle);
                        if !self.exit_hook_registered {
                            self.launcher.register_exit_hook()?;
                            self.exit_hook_registered = true;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to spawn worker"),
                }
                continue;
            };

            if !self.launcher.is_alive(handle) {
                tracing::warn!(pid = handle.pid.as_raw(), "worker is gone, respawning");
                self.worker = None;
                continue;
            }

            match handle.writer.send(content) {
                Ok(()) => {
                    tracing::debug!(pid = handle.pid.as_raw(), len = content.len(), "sent content to worker");
                    self.consecutive_failures = 0;
                    return Ok(Delivery::BackgroundWorker);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "worker pipe closed, respawning");
                    if let Some(handle) = self.worker.take() {
                        self.launcher.stop(handle);
                    }
                }
            }
        }
    }

    /// Stop the worker if one is running
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.worker.take() {
            tracing::debug!(pid = handle.pid.as_raw(), "stopping worker");
            self.launcher.stop(handle);
        }
    }

    /// Block until the worker exits or a signal interrupts the wait
    pub fn hold(&mut self) -> Result<WaitOutcome, ClipboardError> {
        let Some(handle) = self.worker.as_ref() else {
            return Ok(WaitOutcome::Exited);
        };
        let outcome = self.launcher.wait(handle)?;
        if outcome == WaitOutcome::Exited {
            self.worker = None;
        }
        Ok(outcome)
    }

    /// Forget the worker without stopping it, so it outlives this process
    pub fn detach(&mut self) -> Option<Pid> {
        self.worker.take().map(|handle| {
            tracing::info!(pid = handle.pid.as_raw(), "detached worker");
            handle.pid
        })
    }
}

impl<L: WorkerLauncher> Drop for Supervisor<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Launches workers by forking the current process
pub struct ForkLauncher {
    settings: ClipboardSettings,
    exit_hook: extern "C" fn(),
}

impl ForkLauncher {
    pub fn new(settings: ClipboardSettings, exit_hook: extern "C" fn()) -> Self {
        Self {
            settings,
            exit_hook,
        }
    }

    /// Settings every worker from this launcher is started with
    pub fn settings(&self) -> &ClipboardSettings {
        &self.settings
    }
}

/// Point stdin and stdout at /dev/null so callers capturing our output see EOF
/// while the worker lives on. stderr stays attached for diagnostics.
fn detach_stdio() {
    if let Ok(null) = OpenOptions::new().read(true).write(true).open("/dev/null") {
        let _ = dup2(null.as_raw_fd(), libc::STDIN_FILENO);
        let _ = dup2(null.as_raw_fd(), libc::STDOUT_FILENO);
    }
}

fn process_error(err: Errno) -> ClipboardError {
    ClipboardError::ProcessError(err.to_string())
}

impl WorkerLauncher for ForkLauncher {
    fn hand_off(&self, content: &ClipboardContent) -> Result<(), HandoffError> {
        hand_off_to_manager(&self.settings, content)
    }

    fn spawn(&mut self) -> Result<WorkerHandle, ClipboardError> {
        let (read_end, write_end) = pipe().map_err(process_error)?;
        set_nonblocking(&read_end).map_err(process_error)?;

        // SAFETY: the child runs only the worker loop and leaves through _exit,
        // never returning into the caller's stack or running exit hooks
        match unsafe { fork() }.map_err(process_error)? {
            ForkResult::Child => {
                drop(write_end);
                detach_stdio();
                let exit = worker::run(FrameReader::new(read_end), &self.settings);
                unsafe { libc::_exit(exit.code()) }
            }
            ForkResult::Parent { child } => {
                drop(read_end);
                tracing::info!(pid = child.as_raw(), "spawned clipboard worker");
                Ok(WorkerHandle {
                    pid: child,
                    writer: FrameWriter::new(write_end),
                })
            }
        }
    }

    fn is_alive(&self, handle: &WorkerHandle) -> bool {
        matches!(
            waitpid(handle.pid, Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::StillAlive)
        )
    }

    fn stop(&self, handle: WorkerHandle) {
        let WorkerHandle { pid, writer } = handle;
        drop(writer);

        if let Err(e) = kill(pid, Signal::SIGINT) {
            if e != Errno::ESRCH {
                tracing::warn!(pid = pid.as_raw(), error = %e, "failed to signal worker");
                return;
            }
        }
        loop {
            match waitpid(pid, None) {
                Err(Errno::EINTR) => continue,
                Ok(status) => {
                    tracing::debug!(?status, "worker reaped");
                    return;
                }
                Err(_) => return,
            }
        }
    }

    fn wait(&self, handle: &WorkerHandle) -> Result<WaitOutcome, ClipboardError> {
        match waitpid(handle.pid, None) {
            Ok(status) => {
                tracing::info!(?status, "worker exited");
                Ok(WaitOutcome::Exited)
            }
            Err(Errno::EINTR) => Ok(WaitOutcome::Interrupted),
            Err(Errno::ECHILD) => Ok(WaitOutcome::Exited),
            Err(e) => Err(process_error(e)),
        }
    }

    fn register_exit_hook(&self) -> Result<(), ClipboardError> {
        // SAFETY: the hook is a plain extern "C" function with static lifetime
        if unsafe { libc::atexit(self.exit_hook) } != 0 {
            return Err(ClipboardError::ProcessError(
                "cannot register exit hook".to_string(),
            ));
        }
        Ok(())
    }
}
