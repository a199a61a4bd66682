//! Progress and summary notifications.
//!
//! Messages carry one of four [`Level`]s. `state` messages may be dropped by
//! a sink, `inform` is informative, `confirm` signals success and `alert`
//! signals an error. The aggregator only talks to the [`Notifier`] trait;
//! the binary decides which sinks are active.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::runner::{CommandRunner, render_command};

/// Placeholder replaced with the message text in command templates.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Severity of a notification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Level {
    /// Progress chatter that a sink may ignore.
    State,
    /// Informative message.
    Inform,
    /// Confirmation of success.
    Confirm,
    /// Error report.
    Alert,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::State => "state",
            Self::Inform => "inform",
            Self::Confirm => "confirm",
            Self::Alert => "alert",
        })
    }
}

/// Sink for progress and summary messages.
pub trait Notifier {
    /// Delivers `message` at `level`. Delivery failures are the sink's
    /// concern and never surface to the caller.
    fn notify(&self, level: Level, message: &str);

    /// Sends a notification that may be ignored.
    fn state(&self, message: &str) {
        self.notify(Level::State, message);
    }

    /// Sends an informative notification.
    fn inform(&self, message: &str) {
        self.notify(Level::Inform, message);
    }

    /// Sends a confirmation/success notification.
    fn confirm(&self, message: &str) {
        self.notify(Level::Confirm, message);
    }

    /// Sends an error notification.
    fn alert(&self, message: &str) {
        self.notify(Level::Alert, message);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, level: Level, message: &str) {
        (**self).notify(level, message);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, level: Level, message: &str) {
        (**self).notify(level, message);
    }
}

/// When to wrap stdio messages in ANSI colour.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ColorChoice {
    /// Colour only when stdout is a terminal.
    #[default]
    Auto,
    /// Always colour.
    Always,
    /// Never colour.
    Never,
}

impl ColorChoice {
    /// Resolves the choice against whether the output is a terminal.
    #[must_use]
    pub const fn enabled(self, is_terminal: bool) -> bool {
        match self {
            Self::Auto => is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Raised when a colour mode is not `auto`, `always` or `never`.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown colour mode `{0}`: expected auto, always or never")]
pub struct ParseColorChoiceError(pub String);

impl FromStr for ColorChoice {
    type Err = ParseColorChoiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(ParseColorChoiceError(value.to_owned())),
        }
    }
}

/// Writes every message as one line on standard output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StdioNotifier {
    color: bool,
}

impl StdioNotifier {
    /// Creates a notifier, resolving `choice` against the current stdout.
    #[must_use]
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            color: choice.enabled(io::stdout().is_terminal()),
        }
    }

    /// Creates a notifier that never emits escape sequences.
    #[must_use]
    pub const fn plain() -> Self {
        Self { color: false }
    }

    /// Formats `message` the way it appears on the terminal.
    #[must_use]
    pub fn render(&self, level: Level, message: &str) -> String {
        if !self.color {
            return message.to_owned();
        }

        let code = match level {
            Level::State => 7,
            Level::Inform => 6,
            Level::Confirm => 2,
            Level::Alert => 1,
        };
        format!(
            "\u{1b}[0;{bg}m  \u{1b}[0;1;{fg}m {message}\u{1b}[0m",
            bg = code + 40,
            fg = code + 30
        )
    }
}

impl Notifier for StdioNotifier {
    fn notify(&self, level: Level, message: &str) {
        let line = self.render(level, message);
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}").ok();
        stdout.flush().ok();
    }
}

/// Errors raised while building a [`CommandNotifier`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NotifierError {
    /// Raised when a level has no template and no fallback is configured.
    #[error("no command configured for {level} notifications and no fallback given")]
    MissingTemplate {
        /// Level lacking a template.
        level: Level,
    },
    /// Raised when a template has no program.
    #[error("the {level} notification command is empty")]
    EmptyTemplate {
        /// Level whose template is empty.
        level: Level,
    },
}

/// Argument templates for a [`CommandNotifier`].
///
/// Each template is a program followed by its arguments. Levels left as
/// `None` use `fallback`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandTemplates {
    /// Template for `state` messages.
    pub state: Option<Vec<String>>,
    /// Template for `inform` messages.
    pub inform: Option<Vec<String>>,
    /// Template for `confirm` messages.
    pub confirm: Option<Vec<String>>,
    /// Template for `alert` messages.
    pub alert: Option<Vec<String>>,
    /// Template for any level without its own.
    pub fallback: Option<Vec<String>>,
}

impl CommandTemplates {
    /// Splits a whitespace-separated command line into a template.
    #[must_use]
    pub fn split(command: &str) -> Vec<String> {
        command.split_whitespace().map(str::to_owned).collect()
    }

    /// Templates that drive the `notify-send` desktop utility.
    #[must_use]
    pub fn notify_send() -> Self {
        let with_urgency = |urgency: &str| {
            ["notify-send", "-c", "suiterun", "-u", urgency, MESSAGE_PLACEHOLDER]
                .map(str::to_owned)
                .to_vec()
        };
        Self {
            state: Some(with_urgency("low")),
            inform: Some(with_urgency("normal")),
            confirm: Some(with_urgency("normal")),
            alert: Some(with_urgency("critical")),
            fallback: None,
        }
    }

    const fn for_level(&self, level: Level) -> Option<&Vec<String>> {
        let specific = match level {
            Level::State => self.state.as_ref(),
            Level::Inform => self.inform.as_ref(),
            Level::Confirm => self.confirm.as_ref(),
            Level::Alert => self.alert.as_ref(),
        };
        match specific {
            Some(template) => Some(template),
            None => self.fallback.as_ref(),
        }
    }
}

/// Sends each notification by running an external command.
#[derive(Clone, Debug)]
pub struct CommandNotifier<R: CommandRunner> {
    templates: CommandTemplates,
    runner: R,
}

impl<R: CommandRunner> CommandNotifier<R> {
    /// Validates `templates` and wires them to `runner`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::MissingTemplate`] when a level has neither
    /// its own template nor a fallback, and
    /// [`NotifierError::EmptyTemplate`] when a template names no program.
    pub fn new(templates: CommandTemplates, runner: R) -> Result<Self, NotifierError> {
        for level in [Level::State, Level::Inform, Level::Confirm, Level::Alert] {
            let template = templates
                .for_level(level)
                .ok_or(NotifierError::MissingTemplate { level })?;
            if template.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(NotifierError::EmptyTemplate { level });
            }
        }
        Ok(Self { templates, runner })
    }

    /// Returns the program and arguments used for `message` at `level`.
    #[must_use]
    pub fn command_for(&self, level: Level, message: &str) -> Option<(String, Vec<OsString>)> {
        let template = self.templates.for_level(level)?;
        let (program, rest) = template.split_first()?;
        let args = rest
            .iter()
            .map(|arg| OsString::from(arg.replace(MESSAGE_PLACEHOLDER, message)))
            .collect();
        Some((program.clone(), args))
    }
}

impl<R: CommandRunner> Notifier for CommandNotifier<R> {
    fn notify(&self, level: Level, message: &str) {
        let Some((program, args)) = self.command_for(level, message) else {
            return;
        };
        debug!(command = %render_command(&program, &args), %level, "sending notification");
        match self.runner.run(&program, &args) {
            Ok(output) if output.is_success() => {}
            Ok(output) => warn!(
                program,
                status = ?output.code,
                stderr = %output.stderr.trim(),
                "notification command failed"
            ),
            Err(err) => warn!(error = %err, "notification command could not run"),
        }
    }
}

/// Forwards every notification to each member in order.
///
/// A quiet group drops [`Level::State`] messages before they reach any
/// member.
#[derive(Default)]
pub struct GroupedNotifiers {
    notifiers: Vec<Box<dyn Notifier>>,
    quiet: bool,
}

impl GroupedNotifiers {
    /// Creates a group from `notifiers`.
    #[must_use]
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            notifiers,
            quiet: false,
        }
    }

    /// Sets whether `state` messages are dropped.
    pub const fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    /// Adds a member to the end of the group.
    pub fn push(&mut self, notifier: impl Notifier + 'static) {
        self.notifiers.push(Box::new(notifier));
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Returns `true` when the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl fmt::Debug for GroupedNotifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupedNotifiers")
            .field("len", &self.notifiers.len())
            .field("quiet", &self.quiet)
            .finish()
    }
}

impl Notifier for GroupedNotifiers {
    fn notify(&self, level: Level, message: &str) {
        if self.quiet && level == Level::State {
            return;
        }
        for notifier in &self.notifiers {
            notifier.notify(level, message);
        }
    }
}
