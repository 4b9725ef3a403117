//! Ownership of one spawned executable.
//!
//! A [`ProcessHandle`] redirects the output of the process into its
//! directory, waits for readiness markers in those files, and stops the
//! process exactly once: on [`ProcessHandle::close`] or, failing that, when
//! the handle is dropped.

use super::ProcessError;
use crate::rpc::CommunicationError;
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Grace period between SIGINT and SIGKILL
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output file of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout.txt",
            LogStream::Stderr => "stderr.txt",
        }
    }
}

/// How a process ended when it was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Exited within the grace period after SIGINT
    Graceful(ExitStatus),
    /// Ignored SIGINT and received SIGKILL
    Killed,
    /// Had already exited on its own
    AlreadyExited(ExitStatus),
}

#[derive(Debug)]
pub struct ProcessHandle {
    name: String,
    directory: PathBuf,
    child: Option<Child>,
    close_timeout: Duration,
}

impl ProcessHandle {
    /// Start `program` with its output redirected to `<directory>/stdout.txt`
    /// and `<directory>/stderr.txt`.
    pub fn spawn<I, S>(
        name: impl Into<String>,
        program: &Path,
        args: I,
        directory: &Path,
    ) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let name = name.into();
        fs::create_dir_all(directory)?;
        let directory = fs::canonicalize(directory)?;
        let stdout = File::create(directory.join(LogStream::Stdout.file_name()))?;
        let stderr = File::create(directory.join(LogStream::Stderr.file_name()))?;

        // The child runs inside its directory, so relative program paths are
        // anchored here first. Bare names are still searched in PATH.
        let program = if program.is_relative() && program.components().count() > 1 {
            std::path::absolute(program)?
        } else {
            program.to_path_buf()
        };

        let child = Command::new(&program)
            .args(args)
            .current_dir(&directory)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                name: name.clone(),
                program: program.clone(),
                source,
            })?;

        info!("Started {} (pid {}) from {:?}", name, child.id(), program);
        Ok(Self {
            name,
            directory,
            child: Some(child),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        })
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn log_path(&self, stream: LogStream) -> PathBuf {
        self.directory.join(stream.file_name())
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.log_path(LogStream::Stderr)
    }

    /// Exit status, if the process has already exited
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child.as_mut().and_then(|child| child.try_wait().ok().flatten())
    }

    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Block until `marker` shows up in the log of `stream`.
    ///
    /// Fails when `timeout` expires or when the process exits first.
    pub fn wait_for_marker(
        &mut self,
        stream: LogStream,
        marker: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), ProcessError> {
        let path = self.log_path(stream);
        let deadline = Instant::now() + timeout;

        loop {
            let content = fs::read(&path)?;
            if String::from_utf8_lossy(&content).contains(marker) {
                debug!("{} printed {:?}", self.name, marker);
                return Ok(());
            }

            if let Some(status) = self.exit_status() {
                return Err(self.startup_failure(format!(
                    "exited with {} before printing {:?}",
                    status, marker
                )));
            }

            if Instant::now() >= deadline {
                return Err(self.startup_failure(format!(
                    "{:?} not printed within {:?}",
                    marker, timeout
                )));
            }

            thread::sleep(poll_interval);
        }
    }

    /// Call `probe` until it succeeds, at most `attempts` times.
    pub fn handshake<T, F>(
        &mut self,
        attempts: u32,
        interval: Duration,
        mut probe: F,
    ) -> Result<T, ProcessError>
    where
        F: FnMut() -> Result<T, CommunicationError>,
    {
        let mut last_error = None;
        for attempt in 1..=attempts {
            match probe() {
                Ok(answer) => {
                    debug!("{} answered after {} attempt(s)", self.name, attempt);
                    return Ok(answer);
                }
                Err(e) => {
                    debug!("{} handshake attempt {}/{} failed: {}", self.name, attempt, attempts, e);
                    last_error = Some(e);
                }
            }

            if let Some(status) = self.exit_status() {
                return Err(self.startup_failure(format!("exited with {} during handshake", status)));
            }
            if attempt < attempts {
                thread::sleep(interval);
            }
        }

        let reason = match last_error {
            Some(e) => format!("no answer after {} attempt(s): {}", attempts, e),
            None => "no handshake attempted".to_string(),
        };
        Err(self.startup_failure(reason))
    }

    fn startup_failure(&self, reason: String) -> ProcessError {
        ProcessError::StartupFailure {
            name: self.name.clone(),
            reason,
            stderr: self.stderr_path(),
        }
    }

    /// Stop the process: SIGINT, then SIGKILL once the grace period is over.
    ///
    /// Returns `None` when the process was already closed.
    pub fn close(&mut self) -> Option<CloseOutcome> {
        let mut child = self.child.take()?;

        if let Ok(Some(status)) = child.try_wait() {
            debug!("{} had already exited with {}", self.name, status);
            return Some(CloseOutcome::AlreadyExited(status));
        }

        let pid = Pid::from_raw(child.id() as i32);
        match kill(pid, Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("Failed to send SIGINT to {}: {}", self.name, e),
        }

        let deadline = Instant::now() + self.close_timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Closed {} ({})", self.name, status);
                    return Some(CloseOutcome::Graceful(status));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Cannot query state of {}: {}", self.name, e);
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(CLOSE_POLL_INTERVAL);
        }

        warn!(
            "{} did not stop within {:?}, sending SIGKILL",
            self.name, self.close_timeout
        );
        if let Err(e) = child.kill() {
            warn!("Failed to kill {}: {}", self.name, e);
        }
        if let Err(e) = child.wait() {
            warn!("Failed to reap {}: {}", self.name, e);
        }
        Some(CloseOutcome::Killed)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, directory: &Path) -> ProcessHandle {
        ProcessHandle::spawn("sh", Path::new("/bin/sh"), ["-c", script], directory).unwrap()
    }

    #[test]
    fn test_output_is_redirected() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("echo out; echo err >&2; sleep 5", dir.path());
        handle
            .wait_for_marker(LogStream::Stderr, "err", Duration::from_secs(5), Duration::from_millis(20))
            .unwrap();
        handle
            .wait_for_marker(LogStream::Stdout, "out", Duration::from_secs(5), Duration::from_millis(20))
            .unwrap();
        assert!(handle.is_running());
    }

    #[test]
    fn test_marker_timeout_names_stderr() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("sleep 5", dir.path());
        let err = handle
            .wait_for_marker(LogStream::Stderr, "ready", Duration::from_millis(200), Duration::from_millis(20))
            .unwrap_err();
        match err {
            ProcessError::StartupFailure { stderr, .. } => {
                assert_eq!(stderr, fs::canonicalize(dir.path()).unwrap().join("stderr.txt"))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_exit_before_marker() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("exit 3", dir.path());
        let err = handle
            .wait_for_marker(LogStream::Stderr, "ready", Duration::from_secs(5), Duration::from_millis(20))
            .unwrap_err();
        assert!(err.to_string().contains("before printing"));
        assert!(matches!(handle.close(), Some(CloseOutcome::AlreadyExited(_))));
    }

    #[test]
    fn test_close_is_graceful_and_happens_once() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("exec sleep 30", dir.path());
        assert!(matches!(handle.close(), Some(CloseOutcome::Graceful(_))));
        assert!(handle.close().is_none());
        assert!(!handle.is_running());
    }

    #[test]
    fn test_handshake_retries_then_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("sleep 5", dir.path());
        let mut calls = 0;
        let answer = handle
            .handshake(5, Duration::from_millis(10), || {
                calls += 1;
                if calls < 3 {
                    Err(CommunicationError::InvalidResponse {
                        endpoint: "test".to_string(),
                        reason: "not yet".to_string(),
                    })
                } else {
                    Ok(calls)
                }
            })
            .unwrap();
        assert_eq!(answer, 3);
    }

    #[test]
    fn test_handshake_exhaustion() {
        let dir = TempDir::new().unwrap();
        let mut handle = sh("sleep 5", dir.path());
        let result: Result<(), _> = handle.handshake(2, Duration::from_millis(10), || {
            Err(CommunicationError::InvalidResponse {
                endpoint: "test".to_string(),
                reason: "never".to_string(),
            })
        });
        assert!(matches!(result, Err(ProcessError::StartupFailure { .. })));
    }
}
