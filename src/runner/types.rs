//! Core runner types and the command runner abstraction.

use std::ffi::OsString;
use std::time::Duration;

use thiserror::Error;

/// Result of running an external command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process was killed because it exceeded its timeout.
    pub timed_out: bool,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0)) && !self.timed_out
    }
}

/// Errors raised while starting or supervising a command.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RunnerError {
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when waiting on a running child fails.
    #[error("failed to wait for {program}: {message}")]
    Wait {
        /// Command that was being waited on.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Spawn`] if the command cannot be started and
    /// [`RunnerError::Wait`] if its exit status cannot be collected.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RunnerError>;

    /// Timeout applied to each invocation, if any.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RunnerError> {
        (**self).run(program, args)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }
}
