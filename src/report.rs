//! Run reports and the final summary.
//!
//! A [`RunReportBuilder`] is the accumulator threaded through one
//! aggregation pass. [`RunReportBuilder::finish`] turns it into an immutable
//! [`RunReport`], which is the only value [`report`] accepts.

use crate::job::{JobOutcome, JobStatus};
use crate::notifier::Notifier;

/// Process exit code when every job passed.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code when any job failed or discovery failed.
pub const EXIT_FAILURE: i32 = 1;

/// Accumulates job outcomes during a run.
#[derive(Clone, Debug, Default)]
pub struct RunReportBuilder {
    outcomes: Vec<JobOutcome>,
}

impl RunReportBuilder {
    /// Starts an empty report sized for `expected` jobs.
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(expected),
        }
    }

    /// Appends the outcome of a completed job.
    ///
    /// Outcomes still marked [`JobStatus::Pending`] are not completed and are
    /// ignored.
    pub fn record(&mut self, outcome: JobOutcome) {
        if outcome.status == JobStatus::Pending {
            tracing::warn!(job = %outcome.job, "ignoring pending outcome");
            return;
        }
        self.outcomes.push(outcome);
    }

    /// Finalises the report.
    #[must_use]
    pub fn finish(self) -> RunReport {
        RunReport {
            outcomes: self.outcomes,
        }
    }
}

/// Aggregated outcome of one invocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    outcomes: Vec<JobOutcome>,
}

impl RunReport {
    /// Outcomes in execution order.
    #[must_use]
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Number of jobs that were run.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of jobs that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_passed())
            .count()
    }

    /// Number of jobs that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_failed())
            .count()
    }

    /// Returns `true` when no job failed. An empty report is successful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Exit code for the process: 0 when no job failed, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let total = self.total();
        let failures = self.failures();
        if failures == 0 {
            format!("SUCCESS: {total} TEST(S) PASSED.")
        } else {
            format!("ERROR: {failures} OUT OF {total} TEST(S) FAILED.")
        }
    }
}

/// Emits the summary through `notifier` and returns the process exit code.
///
/// Success is sent with [`Notifier::confirm`], failure with
/// [`Notifier::alert`].
pub fn report(run: &RunReport, notifier: &dyn Notifier) -> i32 {
    let summary = run.summary_line();
    if run.is_success() {
        notifier.confirm(&summary);
    } else {
        notifier.alert(&summary);
    }
    run.exit_code()
}
