//! Job identity and outcome types.
//!
//! A [`Job`] is one executable unit found during discovery. Running it
//! produces a [`JobOutcome`] whose [`JobStatus`] is fixed once the job has
//! completed.

use std::fmt;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

/// A single independently executable test or build unit.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Job {
    path: Utf8PathBuf,
}

impl Job {
    /// Creates a job for the executable at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path used to spawn the job, relative to the invocation directory
    /// unless discovery was given an absolute root.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// File name of the job, used when the full path is too noisy.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path.as_str())
    }
}

/// Reason a job was recorded as failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobFailure {
    /// The job exited with a non-zero status.
    ExitCode(i32),
    /// The job ended without an exit status, for example when killed by a
    /// signal.
    Terminated,
    /// The job was still running when the per-job timeout expired and was
    /// killed.
    TimedOut {
        /// Timeout that was exceeded.
        after: Duration,
    },
    /// The job could not be started at all.
    Spawn {
        /// Operating system error string.
        message: String,
    },
    /// The job started but its exit status could not be collected.
    Wait {
        /// Operating system error string.
        message: String,
    },
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode(code) => write!(f, "exit status {code}"),
            Self::Terminated => f.write_str("terminated without an exit status"),
            Self::TimedOut { after } => write!(f, "timed out after {}s", after.as_secs()),
            Self::Spawn { message } => write!(f, "failed to start: {message}"),
            Self::Wait { message } => write!(f, "lost track of the process: {message}"),
        }
    }
}

/// Execution state of a job.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum JobStatus {
    /// Discovered but not yet run.
    #[default]
    Pending,
    /// Exited with status zero.
    Passed,
    /// Did not pass.
    Failed(JobFailure),
}

impl JobStatus {
    /// Returns `true` for [`JobStatus::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns `true` for [`JobStatus::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Final record of one job execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobOutcome {
    /// Job that was run.
    pub job: Job,
    /// Status after the job completed.
    pub status: JobStatus,
    /// Exit code reported by the process, if any.
    pub exit_code: Option<i32>,
    /// Wall-clock time spent waiting for the job.
    pub duration: Duration,
}

impl JobOutcome {
    /// Records a job that exited with status zero.
    #[must_use]
    pub const fn passed(job: Job, duration: Duration) -> Self {
        Self {
            job,
            status: JobStatus::Passed,
            exit_code: Some(0),
            duration,
        }
    }

    /// Records a failed job.
    #[must_use]
    pub const fn failed(
        job: Job,
        failure: JobFailure,
        exit_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        Self {
            job,
            status: JobStatus::Failed(failure),
            exit_code,
            duration,
        }
    }
}
