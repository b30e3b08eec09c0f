use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{OperationError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: String,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Converts a non-zero exit into `OperationError::CommandFailed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command did not exit successfully.
    pub fn into_success(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(OperationError::CommandFailed {
            command: self.command,
            status: self.status.to_string(),
            stderr: last_lines(&self.stderr, 20),
        })
    }
}

/// Runs `program` in `cwd`, killing it once `timeout` elapses.
///
/// Both pipes are drained on reader threads so a chatty child cannot block
/// on a full pipe while we wait for it.
///
/// # Errors
///
/// Returns `CommandSpawn` if the program cannot be started and
/// `CommandTimedOut` if it outlives `timeout`.
pub fn run_with_timeout<I, S>(
    program: &str,
    args: I,
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect();
    let command_line = std::iter::once(program.to_string())
        .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");

    debug!(command = %command_line, cwd = %cwd.display(), "running command");

    let mut child = Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| OperationError::CommandSpawn {
            program: program.to_string(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    // Reader threads are left detached on timeout: grandchildren may still
    // hold the pipes open.
    let Some(status) = wait_with_deadline(&mut child, timeout)? else {
        warn!(command = %command_line, timeout_secs = timeout.as_secs(), "command timed out");
        return Err(OperationError::CommandTimedOut {
            command: command_line,
            timeout_secs: timeout.as_secs(),
        });
    };

    Ok(CommandOutput {
        command: command_line,
        status,
        stdout: join_output(stdout),
        stderr: join_output(stderr),
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

pub(crate) fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
