//! External job command builder and runner.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use vgate_models::{JobInvocation, JobOutput};

use crate::error::{JobError, JobResult};

/// Builder for an external job command line.
#[derive(Debug, Clone)]
pub struct JobCommand {
    /// Executable
    program: PathBuf,
    /// Arguments, in order
    args: Vec<String>,
}

impl JobCommand {
    /// Create a new command for `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Build the command for a job invocation.
    pub fn from_invocation(invocation: &JobInvocation) -> Self {
        Self::new(&invocation.program).args(invocation.args())
    }

    /// Add one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The command arguments.
    pub fn build_args(&self) -> Vec<String> {
        self.args.clone()
    }
}

/// Runner for external jobs with stderr streaming, timeout and cancellation.
///
/// The child is spawned with `kill_on_drop`, so dropping the future returned
/// by [`JobRunner::run`] (e.g. when the client disconnects) kills the job.
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Upper bound on job duration
    timeout: Option<Duration>,
}

/// How the wait for the child ended.
enum Waited {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

impl JobRunner {
    /// Create a new runner with no timeout and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set an optional timeout.
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a job and capture its output.
    pub async fn run(&self, cmd: &JobCommand) -> JobResult<JobOutput> {
        self.run_with_stderr(cmd, |_| {}).await
    }

    /// Run a job, handing every stderr line to `on_line` as it arrives.
    pub async fn run_with_stderr<F>(&self, cmd: &JobCommand, on_line: F) -> JobResult<JobOutput>
    where
        F: Fn(&str) + Send + 'static,
    {
        let program = check_program(cmd.program())?;

        let args = cmd.build_args();
        debug!("Running job: {} {}", program.display(), args.join(" "));

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| JobError::spawn(cmd.program(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| JobError::internal("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| JobError::internal("stderr not captured"))?;

        let stdout_handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            BufReader::new(stdout).read_to_end(&mut buf).await.map(|_| buf)
        });

        // Stream stderr line by line, keeping the raw bytes for the caller
        let stderr_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut collected = Vec::new();
            let mut line = Vec::new();

            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let text = String::from_utf8_lossy(&line);
                        on_line(text.trim_end_matches(['\r', '\n']));
                        collected.extend_from_slice(&line);
                    }
                }
            }

            String::from_utf8_lossy(&collected).into_owned()
        });

        let status = match self.wait_for_completion(&mut child).await {
            Ok(status) => status,
            Err(e) => {
                stdout_handle.abort();
                stderr_handle.abort();
                return Err(e);
            }
        };

        let stdout = stdout_handle
            .await
            .map_err(|e| JobError::internal(format!("stdout reader failed: {}", e)))??;
        let stderr = stderr_handle
            .await
            .map_err(|e| JobError::internal(format!("stderr reader failed: {}", e)))?;

        let output = JobOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
            exit_code: status.code(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if status.success() {
            Ok(output)
        } else {
            Err(JobError::failed(output.stderr, output.exit_code))
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> JobResult<ExitStatus> {
        let waited = tokio::select! {
            status = child.wait() => Waited::Exited(status),
            _ = deadline(self.timeout) => Waited::TimedOut,
            _ = cancelled(self.cancel_rx.clone()) => Waited::Cancelled,
        };

        match waited {
            Waited::Exited(status) => Ok(status?),
            Waited::TimedOut => {
                let timeout = self.timeout.unwrap_or_default();
                warn!("Job timed out after {:?}, killing process", timeout);
                let _ = child.kill().await;
                Err(JobError::Timeout(timeout))
            }
            Waited::Cancelled => {
                info!("Job cancelled, killing process");
                let _ = child.kill().await;
                Err(JobError::Cancelled)
            }
        }
    }
}

/// Resolves once the timeout elapses; never when there is none.
async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the signal flips to `true`; never if the sender is gone first.
async fn cancelled(cancel_rx: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = cancel_rx {
        if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
            return;
        }
    }
    std::future::pending().await
}

/// Check that the job program can be executed, returning its resolved path.
pub fn check_program(program: impl AsRef<Path>) -> JobResult<PathBuf> {
    let program = program.as_ref();
    which::which(program).map_err(|_| JobError::ProgramNotFound(program.to_path_buf()))
}
