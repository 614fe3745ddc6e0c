//! Running external commands with captured output and a deadline.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on any single git or build invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A program and its argument list, never split from a shell string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build from an argv vector; `None` if it is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Human-readable rendering for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output of a command that ran to completion.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The most useful text to show for a failed run.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exited with {}", self.status)
    }
}

/// A command that could not be run to completion.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {}s and was killed", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// True when the program itself could not be found.
    pub fn is_program_missing(&self) -> bool {
        matches!(
            self,
            RunError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Spawns commands and waits for them with a timeout.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a structured command in `dir`.
    pub fn run_spec(&self, spec: &CommandSpec, dir: &Path) -> Result<CommandOutput, RunError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).current_dir(dir);
        self.run(&mut command, &spec.program)
    }

    /// Run a raw shell string in `dir` through the platform shell.
    pub fn run_shell(&self, script: &str, dir: &Path) -> Result<CommandOutput, RunError> {
        let (shell, flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        let mut command = Command::new(shell);
        command.args([flag, script]).current_dir(dir);
        self.run(&mut command, shell)
    }

    /// Spawn `command`, capture its output, and kill it once the timeout
    /// elapses. `label` names the program in errors.
    ///
    /// The deadline also bounds reading the output, so a background process
    /// that inherited the pipes cannot hold the run open after the command
    /// itself has exited.
    pub fn run(&self, command: &mut Command, label: &str) -> Result<CommandOutput, RunError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program = label, "Spawning command");
        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: label.to_string(),
            source,
        })?;

        let (tx, rx) = mpsc::channel();
        let mut pending = 0;
        if let Some(pipe) = child.stdout.take() {
            drain(pipe, Stream::Stdout, tx.clone());
            pending += 1;
        }
        if let Some(pipe) = child.stderr.take() {
            drain(pipe, Stream::Stderr, tx.clone());
            pending += 1;
        }
        drop(tx);

        let status = self.wait_with_deadline(&mut child, label, started)?;
        let (stdout, stderr) = self.collect_with_deadline(&rx, pending, label, started)?;

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
        })
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        label: &str,
        started: Instant,
    ) -> Result<ExitStatus, RunError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    return Err(RunError::Wait {
                        program: label.to_string(),
                        source,
                    });
                }
            }

            if started.elapsed() >= self.timeout {
                warn!(
                    program = label,
                    timeout_secs = self.timeout.as_secs(),
                    "Command timed out; killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timed_out(label));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn collect_with_deadline(
        &self,
        rx: &Receiver<(Stream, Vec<u8>)>,
        pending: usize,
        label: &str,
        started: Instant,
    ) -> Result<(String, String), RunError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        for _ in 0..pending {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            match rx.recv_timeout(remaining) {
                Ok((stream, bytes)) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    match stream {
                        Stream::Stdout => stdout = text,
                        Stream::Stderr => stderr = text,
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        program = label,
                        timeout_secs = self.timeout.as_secs(),
                        "Output still open after exit; a background process holds the pipes"
                    );
                    return Err(self.timed_out(label));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok((stdout, stderr))
    }

    fn timed_out(&self, label: &str) -> RunError {
        RunError::TimedOut {
            program: label.to_string(),
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read `pipe` to the end on its own thread and send the bytes on `tx`.
fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program_and_args() {
        let argv = vec!["npm".to_string(), "run".to_string(), "build".to_string()];
        let spec = CommandSpec::from_argv(&argv).expect("spec");
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["run", "build"]);
        assert_eq!(spec.display(), "npm run build");
        assert!(CommandSpec::from_argv(&[]).is_none());
    }

    #[test]
    fn missing_program_is_reported_as_spawn_failure() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let err = ProcessRunner::default()
            .run_spec(&CommandSpec::new("skiff-definitely-not-a-program"), dir.path())
            .unwrap_err();
        assert!(err.is_program_missing());
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_status() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let output = ProcessRunner::default()
            .run_shell("echo out; echo err >&2; exit 3", dir.path())
            .expect("run");
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.failure_detail(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_the_given_directory() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("marker.txt"), "x").expect("write marker");
        let output = ProcessRunner::default()
            .run_spec(&CommandSpec::new("ls"), dir.path())
            .expect("run");
        assert!(output.success());
        assert!(output.stdout.contains("marker.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn kills_command_after_timeout() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let started = Instant::now();
        let err = ProcessRunner::new(Duration::from_millis(200))
            .run_spec(&CommandSpec::new("sleep").with_args(["5"]), dir.path())
            .unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn background_process_holding_pipes_does_not_outlive_timeout() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let started = Instant::now();
        let err = ProcessRunner::new(Duration::from_millis(500))
            .run_shell("sleep 5 & echo started", dir.path())
            .unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
