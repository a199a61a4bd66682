//! Runners that shell out to the host operating system.
//!
//! Both runners pipe the child's output, drain each pipe on its own thread
//! and block until the child exits. With a timeout configured the child is
//! started as the leader of a new process group, polled until the deadline
//! and then killed together with everything it started, so descendants
//! holding the pipes open cannot stall collection.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::types::{CommandOutput, CommandRunner, RunnerError};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const SPAWN_BUSY_RETRIES: u32 = 5;
const SPAWN_BUSY_BACKOFF: Duration = Duration::from_millis(50);
const PIPE_BUFFER_SIZE: usize = 8 * 1024;

/// Runner that captures output without echoing it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProcessCommandRunner {
    timeout: Option<Duration>,
}

impl ProcessCommandRunner {
    /// Creates a runner that waits indefinitely for each command.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Sets the per-command timeout. `None` waits indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RunnerError> {
        execute(program, args, self.timeout, Forwarding::Capture)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Runner that forwards child output to this process's stdout and stderr
/// as it arrives, while also capturing it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamingCommandRunner {
    timeout: Option<Duration>,
}

impl StreamingCommandRunner {
    /// Creates a runner that waits indefinitely for each command.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Sets the per-command timeout. `None` waits indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for StreamingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RunnerError> {
        execute(program, args, self.timeout, Forwarding::Tee)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Forwarding {
    Capture,
    Tee,
}

fn execute(
    program: &str,
    args: &[OsString],
    timeout: Option<Duration>,
    forwarding: Forwarding,
) -> Result<CommandOutput, RunnerError> {
    let mut child = spawn(program, args, timeout.is_some())?;

    let tee = forwarding == Forwarding::Tee;
    let stdout_drain = child
        .stdout
        .take()
        .map(|pipe| drain(pipe, tee.then(io::stdout)));
    let stderr_drain = child
        .stderr
        .take()
        .map(|pipe| drain(pipe, tee.then(io::stderr)));

    let waited = wait(&mut child, program, timeout);
    if waited.is_err() {
        kill_tree(&mut child);
        child.wait().ok();
    }

    let stdout = collect(stdout_drain);
    let stderr = collect(stderr_drain);
    let (status, timed_out) = waited?;

    Ok(CommandOutput {
        code: status.code(),
        stdout,
        stderr,
        timed_out,
    })
}

fn spawn(program: &str, args: &[OsString], isolate: bool) -> Result<Child, RunnerError> {
    let mut attempt = 0;
    loop {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if isolate {
            new_process_group(&mut command);
        }

        let spawned = command.spawn();

        match spawned {
            Ok(child) => return Ok(child),
            // A freshly written executable can still be open for writing in a
            // forked sibling; the condition clears once that sibling execs.
            Err(err)
                if err.kind() == io::ErrorKind::ExecutableFileBusy
                    && attempt < SPAWN_BUSY_RETRIES =>
            {
                attempt += 1;
                debug!(program, attempt, "executable busy, retrying spawn");
                thread::sleep(SPAWN_BUSY_BACKOFF);
            }
            Err(err) => {
                return Err(RunnerError::Spawn {
                    program: program.to_owned(),
                    message: err.to_string(),
                });
            }
        }
    }
}

fn wait(
    child: &mut Child,
    program: &str,
    timeout: Option<Duration>,
) -> Result<(ExitStatus, bool), RunnerError> {
    let wait_error = |err: io::Error| RunnerError::Wait {
        program: program.to_owned(),
        message: err.to_string(),
    };

    let Some(limit) = timeout else {
        return child.wait().map(|status| (status, false)).map_err(wait_error);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().map_err(wait_error)? {
            return Ok((status, false));
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(program, timeout_secs = limit.as_secs(), "killing command after timeout");
            // The child may exit between the poll and the kill; `wait` still
            // reaps it either way.
            kill_tree(child);
            let status = child.wait().map_err(wait_error)?;
            return Ok((status, true));
        }

        thread::sleep(WAIT_POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(unix)]
fn new_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(unix))]
const fn new_process_group(_command: &mut Command) {}

/// Kills the child and, on Unix, every process in its group.
///
/// The group only exists when the child was spawned with a timeout; for
/// other children `killpg` fails and the direct kill still applies.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    if let Ok(group) = libc::pid_t::try_from(child.id()) {
        // SAFETY: `killpg` takes no pointers. The child has not been reaped
        // yet, so its pid still names the group it leads.
        let sent = unsafe { libc::killpg(group, libc::SIGKILL) };
        if sent != 0 {
            debug!(
                pid = child.id(),
                error = %io::Error::last_os_error(),
                "process group kill failed"
            );
        }
    }
    child.kill().ok();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    child.kill().ok();
}

fn drain<P, W>(mut pipe: P, sink: Option<W>) -> JoinHandle<Vec<u8>>
where
    P: Read + Send + 'static,
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        let mut forward = sink;
        let mut captured = Vec::new();
        let mut buffer = [0_u8; PIPE_BUFFER_SIZE];
        loop {
            match pipe.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    let Some(chunk) = buffer.get(..read) else {
                        break;
                    };
                    captured.extend_from_slice(chunk);
                    if let Some(out) = forward.as_mut()
                        && out.write_all(chunk).and_then(|()| out.flush()).is_err()
                    {
                        // Keep draining so the child never blocks on a full pipe.
                        forward = None;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        captured
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|drain_thread| drain_thread.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
