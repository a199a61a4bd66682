//! Command-line interface definitions for the `suiterun` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `suiterun` binary.
///
/// Every flag is optional; without flags the job directory and behaviour
/// come from configuration files and `SUITERUN_*` environment variables.
#[derive(Debug, Parser)]
#[command(
    name = "suiterun",
    version,
    about = "Run every executable job in a directory and report how many failed"
)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "clap flags map one-to-one onto boolean switches"
)]
pub(crate) struct Cli {
    /// Directory holding one executable job per file.
    ///
    /// Relative paths are resolved against the current directory, which is
    /// also the working directory of every job.
    #[arg(long, value_name = "DIR")]
    pub(crate) jobs_dir: Option<String>,
    /// Descend into subdirectories when discovering jobs.
    #[arg(long)]
    pub(crate) recursive: bool,
    /// Kill any job still running after this many seconds and record it as
    /// failed.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) timeout: Option<u64>,
    /// List the discovered jobs without running them.
    #[arg(long)]
    pub(crate) list: bool,
    /// Report every job as it starts. Overrides the configured verbosity.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,
    /// Only report job results and the summary. Overrides the configured
    /// verbosity.
    #[arg(short, long)]
    pub(crate) quiet: bool,
}
