//! Command execution engine.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::command::{missing_directory_message, resolve_target, ShellCommand};
use super::result::ExecutionOutcome;
use crate::session::SessionRecord;

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default shell interpreter.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// How long output may keep draining after the shell has exited.
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 8 * 1024;

/// Captured streams of a finished process.
struct ProcessOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
}

/// Runs command lines against a session record.
///
/// The executor holds no session state: it reads the record it is given and
/// reports the resulting working directory in the outcome.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: PathBuf,
    timeout: Duration,
}

impl CommandExecutor {
    /// Create an executor using `/bin/sh` and a 30 second timeout.
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the shell interpreter invoked as `<shell> -c <command>`.
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the wall-clock timeout for spawned commands.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Execute one command line for the given session record.
    pub async fn execute(&self, record: &SessionRecord, command_line: &str) -> ExecutionOutcome {
        let start = Instant::now();
        let outcome = match ShellCommand::parse(command_line) {
            ShellCommand::ChangeDirHome => ExecutionOutcome::silent(record.home()),
            ShellCommand::ChangeDir { target } => change_dir(record, target).await,
            ShellCommand::Other(text) => self.run(record, text).await,
        };
        outcome.with_duration(start.elapsed())
    }

    async fn run(&self, record: &SessionRecord, command_line: &str) -> ExecutionOutcome {
        let working_dir = record.working_dir();

        match self.run_process(record, command_line).await {
            Ok(Some(output)) => {
                tracing::debug!(
                    exit_code = ?output.exit_code,
                    stdout_bytes = output.stdout.len(),
                    stderr_bytes = output.stderr.len(),
                    "Command finished"
                );
                ExecutionOutcome {
                    output: String::from_utf8_lossy(&output.stdout).into_owned(),
                    error: String::from_utf8_lossy(&output.stderr).into_owned(),
                    ..ExecutionOutcome::silent(working_dir)
                }
                .with_exit_code(output.exit_code)
            }
            Ok(None) => {
                tracing::warn!(timeout = ?self.timeout, "Command timed out and was killed");
                let message = format!(
                    "The process \"{}\" exceeded the timeout of {} seconds.\n",
                    command_line,
                    format_seconds(self.timeout)
                );
                ExecutionOutcome::failed(working_dir, message).with_timeout()
            }
            Err(e) => {
                tracing::warn!("Command could not be run: {}", e);
                ExecutionOutcome::failed(working_dir, format!("{e}\n"))
            }
        }
    }

    /// Spawn the command and collect its output.
    ///
    /// Returns `Ok(None)` when the timeout elapsed; the process group has
    /// been killed and reaped by then.
    async fn run_process(
        &self,
        record: &SessionRecord,
        command_line: &str,
    ) -> io::Result<Option<ProcessOutput>> {
        let mut cmd = tokio::process::Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command_line)
            .current_dir(record.working_dir())
            .env_clear()
            .envs(&record.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("stderr was not captured"))?;

        let mut stdout = StreamReader::spawn(stdout);
        let mut stderr = StreamReader::spawn(stderr);

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                terminate(&mut child, pid).await;
                stdout.finish().await;
                stderr.finish().await;
                return Ok(None);
            }
        };

        // A background job started by the command inherits the pipes and may
        // keep them open long after the shell itself has exited.
        let drained = tokio::time::timeout(OUTPUT_GRACE, async {
            stdout.wait_eof().await;
            stderr.wait_eof().await;
        })
        .await;
        if drained.is_err() {
            tracing::debug!("Output pipes still open after exit, returning buffered output");
        }

        Ok(Some(ProcessOutput {
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            exit_code: status.code(),
        }))
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

async fn change_dir(record: &SessionRecord, target: &str) -> ExecutionOutcome {
    let resolved = resolve_target(target, record.home(), record.working_dir());

    match canonical_dir(&resolved).await {
        Some(dir) => ExecutionOutcome::silent(dir),
        None => ExecutionOutcome::failed(record.working_dir(), missing_directory_message(target)),
    }
}

/// Canonicalize `path`, keeping it only if it names a directory.
async fn canonical_dir(path: &Path) -> Option<PathBuf> {
    let canonical = tokio::fs::canonicalize(path).await.ok()?;
    let metadata = tokio::fs::metadata(&canonical).await.ok()?;
    metadata.is_dir().then_some(canonical)
}

/// Background task draining one output pipe into a channel of chunks.
struct StreamReader {
    task: JoinHandle<()>,
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl StreamReader {
    fn spawn<R>(mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, chunks) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Failed to read command output: {}", e);
                        break;
                    }
                }
            }
        });
        Self { task, chunks }
    }

    /// Wait until the pipe reaches end of file.
    async fn wait_eof(&mut self) {
        if !self.task.is_finished() {
            let _ = (&mut self.task).await;
        }
    }

    /// Stop reading and return everything read so far.
    async fn finish(mut self) -> Vec<u8> {
        if !self.task.is_finished() {
            self.task.abort();
            let _ = (&mut self.task).await;
        }

        let mut output = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            output.extend_from_slice(&chunk);
        }
        output
    }
}

/// Kill the child and everything it started, then reap it.
///
/// `pid` is taken at spawn time: the shell may already have been reaped
/// while a background job still holds the output pipes open.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        kill_process_group(pid);
    }

    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.kill().await {
        tracing::debug!("Failed to kill timed out command: {}", e);
    }
}

/// The child leads its own process group, so this only reaches processes
/// started for this command.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        tracing::warn!(pid, "Process id out of range, process group not signalled");
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        tracing::debug!(pid, "Failed to kill process group: {}", e);
    }
}

fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}
