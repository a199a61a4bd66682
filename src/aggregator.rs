//! Sequential job aggregation.
//!
//! [`Aggregator::run_all`] runs every job in discovery order, one at a
//! time, and never stops early: a failing job is recorded and the next job
//! starts. Per-job progress goes to the configured [`Notifier`].

use std::time::{Duration, Instant};

use tracing::{debug, info_span};

use crate::job::{Job, JobFailure, JobOutcome, JobStatus};
use crate::notifier::Notifier;
use crate::report::{RunReport, RunReportBuilder};
use crate::runner::{CommandOutput, CommandRunner, RunnerError};

/// Runs jobs through a [`CommandRunner`] and reports through a [`Notifier`].
#[derive(Clone, Debug)]
pub struct Aggregator<R, N> {
    runner: R,
    notifier: N,
}

impl<R, N> Aggregator<R, N>
where
    R: CommandRunner,
    N: Notifier,
{
    /// Creates a new aggregator.
    #[must_use]
    pub const fn new(runner: R, notifier: N) -> Self {
        Self { runner, notifier }
    }

    /// Returns the notifier used for progress messages.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs every job in order and returns the finalised report.
    ///
    /// Individual job failures, including jobs that cannot be started, are
    /// recorded in the report rather than returned as errors.
    pub fn run_all(&self, jobs: &[Job]) -> RunReport {
        let mut report = RunReportBuilder::with_capacity(jobs.len());
        for job in jobs {
            report.record(self.run_one(job));
        }
        report.finish()
    }

    /// Runs a single job to completion.
    pub fn run_one(&self, job: &Job) -> JobOutcome {
        let _span = info_span!("job", job = %job).entered();
        self.notifier.state(&format!("RUNNING {job}"));

        let started = Instant::now();
        let result = self.runner.run(job.path().as_str(), &[]);
        let outcome = classify(job.clone(), result, self.runner.timeout(), started.elapsed());
        debug!(
            exit_code = ?outcome.exit_code,
            elapsed_ms = outcome.duration.as_millis(),
            "job finished"
        );

        match &outcome.status {
            JobStatus::Passed => self.notifier.confirm(&format!("PASSED {job}")),
            JobStatus::Failed(reason) => self.notifier.alert(&format!("FAILED {job} ({reason})")),
            JobStatus::Pending => {}
        }
        outcome
    }
}

fn classify(
    job: Job,
    result: Result<CommandOutput, RunnerError>,
    timeout: Option<Duration>,
    duration: Duration,
) -> JobOutcome {
    match result {
        Ok(output) if output.timed_out => JobOutcome::failed(
            job,
            JobFailure::TimedOut {
                after: timeout.unwrap_or(duration),
            },
            output.code,
            duration,
        ),
        Ok(CommandOutput { code: Some(0), .. }) => JobOutcome::passed(job, duration),
        Ok(CommandOutput {
            code: Some(code), ..
        }) => JobOutcome::failed(job, JobFailure::ExitCode(code), Some(code), duration),
        Ok(CommandOutput { code: None, .. }) => {
            JobOutcome::failed(job, JobFailure::Terminated, None, duration)
        }
        Err(RunnerError::Spawn { message, .. }) => {
            JobOutcome::failed(job, JobFailure::Spawn { message }, None, duration)
        }
        Err(RunnerError::Wait { message, .. }) => {
            JobOutcome::failed(job, JobFailure::Wait { message }, None, duration)
        }
    }
}
