//! Subprocess execution for jobs and notification commands.
//!
//! Every external process goes through [`CommandRunner`] so the aggregator
//! and the command notifier can be driven by scripted fakes in tests.

mod process;
mod types;

pub use process::{ProcessCommandRunner, StreamingCommandRunner};
pub use types::{CommandOutput, CommandRunner, RunnerError};

/// Renders a program and its arguments as a shell-quoted string for logs.
#[must_use]
pub fn render_command(program: &str, args: &[std::ffi::OsString]) -> String {
    let mut rendered = String::from(shell_escape::unix::escape(program.into()));
    for arg in args {
        rendered.push(' ');
        let lossy = arg.to_string_lossy();
        rendered.push_str(shell_escape::unix::escape(lossy).as_ref());
    }
    rendered
}
