//! Core library for the `suiterun` job aggregator.
//!
//! The crate discovers executable jobs in a directory, runs them one after
//! another as subprocesses, and folds their exit statuses into a report
//! whose summary decides the process exit code.

pub mod aggregator;
pub mod config;
pub mod discover;
pub mod job;
pub mod notifier;
pub mod report;
pub mod runner;
#[cfg(test)]
pub mod test_helpers;
pub mod test_support;

pub use aggregator::Aggregator;
pub use config::{AggregatorConfig, ConfigError};
pub use discover::{DiscoveryError, DiscoveryMode, discover};
pub use job::{Job, JobFailure, JobOutcome, JobStatus};
pub use notifier::{Level, Notifier, NotifierError};
pub use report::{RunReport, RunReportBuilder, report};
pub use runner::{
    CommandOutput, CommandRunner, ProcessCommandRunner, RunnerError, StreamingCommandRunner,
};
