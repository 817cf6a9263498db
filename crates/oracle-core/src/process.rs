//! External process execution with a hard timeout
//!
//! Both the reference tool and the implementation under test are opaque
//! executables behind the [`ProcessRunner`] trait. A run never returns an
//! error: a missing executable or an expired timeout becomes a synthetic
//! [`ExecutionResult`] with empty stdout, a fixed diagnostic on stderr and
//! exit code 1.

use oracle_config::settings::FILE_PLACEHOLDER;
use oracle_config::ToolSettings;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Exit code reported for synthetic results
pub const SYNTHETIC_EXIT_CODE: i32 = 1;

/// Why an invocation produced a synthetic result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Killed after exceeding the timeout
    TimedOut,
    /// Executable could not be located
    NotFound,
    /// Executable exists but could not be started or waited on
    SpawnFailed,
}

/// Captured outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Set when the result is synthetic
    pub failure: Option<FailureKind>,
    pub duration: Duration,
}

impl ExecutionResult {
    /// A result for a process that ran to completion
    pub fn completed(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            failure: None,
            duration: Duration::ZERO,
        }
    }

    /// A result standing in for a process that never produced output
    pub fn synthetic(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: SYNTHETIC_EXIT_CODE,
            failure: Some(kind),
            duration: Duration::ZERO,
        }
    }

    fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn timed_out(&self) -> bool {
        self.failure == Some(FailureKind::TimedOut)
    }
}

/// One fully rendered command line plus its time budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Names the operation in diagnostics ("Reference", "Compiler")
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn timeout_message(&self) -> String {
        format!(
            "{} timed out after {} seconds",
            self.label,
            self.timeout.as_secs()
        )
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.program)
    }
}

/// Invocation convention for one tool; `{file}` in `args` becomes the source path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn from_settings(label: impl Into<String>, settings: &ToolSettings) -> Self {
        Self {
            label: label.into(),
            program: settings.program.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// The trusted reference tool (gforth by default)
    pub fn reference(settings: &ToolSettings) -> Self {
        Self::from_settings("Reference", settings)
    }

    /// The implementation under test (the Roth compiler by default)
    pub fn under_test(settings: &ToolSettings) -> Self {
        Self::from_settings("Compiler", settings)
    }

    pub fn invocation_for(&self, source: &Path) -> Invocation {
        let file = source.display().to_string();
        Invocation {
            label: self.label.clone(),
            program: self.program.clone(),
            args: self
                .args
                .iter()
                .map(|arg| arg.replace(FILE_PLACEHOLDER, &file))
                .collect(),
            timeout: self.timeout,
        }
    }
}

/// Capability to run an external program
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> ExecutionResult;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> ExecutionResult {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    poll_interval: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ExecutionResult {
        let start = Instant::now();
        debug!(
            label = %invocation.label,
            program = %invocation.program,
            args = ?invocation.args,
            "spawning"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            command.process_group(0);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(program = %invocation.program, "executable not found");
                return ExecutionResult::synthetic(
                    FailureKind::NotFound,
                    invocation.not_found_message(),
                )
                .with_duration(start.elapsed());
            }
            Err(e) => {
                warn!(program = %invocation.program, error = %e, "failed to spawn");
                return ExecutionResult::synthetic(
                    FailureKind::SpawnFailed,
                    format!("Error running {}: {}", invocation.program, e),
                )
                .with_duration(start.elapsed());
            }
        };

        // One deadline covers both the child and the pipes it may have handed down
        let deadline = start.checked_add(invocation.timeout);

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match wait_with_deadline(&mut child, deadline, self.poll_interval) {
            Ok(Some(status)) => status,
            Ok(None) => return timed_out(invocation, start.elapsed()),
            Err(e) => {
                return ExecutionResult::synthetic(
                    FailureKind::SpawnFailed,
                    format!("Error running {}: {}", invocation.program, e),
                )
                .with_duration(start.elapsed());
            }
        };

        // A background grandchild can hold the pipes open after the child exits
        let (Some(stdout), Some(stderr)) = (
            collect_reader(stdout_reader, deadline),
            collect_reader(stderr_reader, deadline),
        ) else {
            kill_group(&child);
            return timed_out(invocation, start.elapsed());
        };

        let duration = start.elapsed();
        let exit_code = exit_code_of(status);
        debug!(label = %invocation.label, exit_code, ?duration, "finished");
        ExecutionResult::completed(
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
            exit_code,
        )
        .with_duration(duration)
    }
}

fn timed_out(invocation: &Invocation, duration: Duration) -> ExecutionResult {
    warn!(
        label = %invocation.label,
        timeout_secs = invocation.timeout.as_secs(),
        "timed out, process group killed"
    );
    ExecutionResult::synthetic(FailureKind::TimedOut, invocation.timeout_message())
        .with_duration(duration)
}

/// Wait for the child, killing it once the deadline passes. `None` means timed out.
///
/// The child is killed and reaped on every path that does not return its status.
fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
    poll_interval: Duration,
) -> io::Result<Option<ExitStatus>> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(e) => {
                terminate(child);
                return Err(e);
            }
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            terminate(child);
            return Ok(None);
        }
        thread::sleep(poll_interval);
    }
}

fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// SIGKILL the child's process group, taking any grandchildren with it
#[cfg(unix)]
fn kill_group(child: &Child) {
    // The child leads its own group, so its pid is the group id
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Read a pipe to the end on its own thread; the buffer arrives on the channel
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Buffer from a reader, or `None` if it is still open at the deadline
fn collect_reader(reader: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<Vec<u8>> {
    let Some(reader) = reader else {
        return Some(Vec::new());
    };

    let received = match deadline {
        Some(deadline) => reader.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        None => reader.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };

    match received {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    SYNTHETIC_EXIT_CODE
}
