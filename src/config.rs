//! Configuration loading via `ortho-config`.
//!
//! Values merge defaults, `suiterun.toml` (or `.suiterun.toml`, or the file
//! named by `SUITERUN_CONFIG_PATH`) and `SUITERUN_*` environment variables.
//! Command-line flags are applied afterwards by the binary.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::discover::DiscoveryMode;
use crate::notifier::{ColorChoice, CommandTemplates};

/// Default job directory, relative to the invocation directory.
pub const DEFAULT_JOBS_DIR: &str = "tests";

/// Aggregator settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SUITERUN",
    discovery(
        app_name = "suiterun",
        env_var = "SUITERUN_CONFIG_PATH",
        config_file_name = "suiterun.toml",
        dotfile_name = ".suiterun.toml",
        project_file_name = "suiterun.toml"
    )
)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "user-facing toggles read naturally as booleans in suiterun.toml"
)]
pub struct AggregatorConfig {
    /// Directory holding one executable job per file.
    #[ortho_config(default = DEFAULT_JOBS_DIR.to_owned())]
    pub jobs_dir: String,
    /// Whether discovery descends into subdirectories.
    #[ortho_config(default = false)]
    pub recursive: bool,
    /// Seconds after which a still-running job is killed and recorded as
    /// failed. Unset means jobs may run indefinitely.
    pub job_timeout_secs: Option<u64>,
    /// Colour mode for terminal output: `auto`, `always` or `never`.
    #[ortho_config(default = "auto".to_owned())]
    pub color: String,
    /// Whether job output is echoed while jobs run.
    #[ortho_config(default = true)]
    pub stream_output: bool,
    /// Whether to send desktop notifications through `notify-send`.
    #[ortho_config(default = false)]
    pub notify_send: bool,
    /// Command run for every notification; `{message}` is replaced with the
    /// message text.
    pub notify_command: Option<String>,
    /// Command run for error notifications instead of `notify_command`.
    pub notify_alert_command: Option<String>,
    /// Whether per-job `RUNNING` progress is reported. Pass and fail lines
    /// and the summary are always reported.
    #[ortho_config(default = true)]
    pub verbose: bool,
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Indicates a configuration value is present but unusable.
    #[error("invalid {field}: {message}; set SUITERUN_{env_suffix} or fix {field} in suiterun.toml", env_suffix = field.to_uppercase())]
    Invalid {
        /// Configuration field that failed validation.
        field: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl AggregatorConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("suiterun")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a blank job directory or
    /// notification command, a zero timeout, or an unknown colour mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs_dir.trim().is_empty() {
            return Err(invalid("jobs_dir", "must not be empty"));
        }
        if self.job_timeout_secs == Some(0) {
            return Err(invalid("job_timeout_secs", "must be greater than zero"));
        }
        self.color_choice()?;
        Self::require_optional_value(self.notify_command.as_deref(), "notify_command")?;
        Self::require_optional_value(self.notify_alert_command.as_deref(), "notify_alert_command")?;
        if self.notify_alert_command.is_some() && self.notify_command.is_none() {
            return Err(invalid(
                "notify_command",
                "is required when notify_alert_command is set",
            ));
        }
        Ok(())
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
        match value {
            Some(command) if command.trim().is_empty() => Err(invalid(field, "must not be empty")),
            _ => Ok(()),
        }
    }

    /// Job directory as a UTF-8 path.
    #[must_use]
    pub fn jobs_root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.jobs_dir.trim())
    }

    /// Discovery mode derived from `recursive`.
    #[must_use]
    pub const fn discovery_mode(&self) -> DiscoveryMode {
        DiscoveryMode::from_recursive(self.recursive)
    }

    /// Per-job timeout, if configured.
    #[must_use]
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Parsed colour mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `color` is not a known mode.
    pub fn color_choice(&self) -> Result<ColorChoice, ConfigError> {
        self.color
            .parse::<ColorChoice>()
            .map_err(|err| invalid("color", &err.to_string()))
    }

    /// Command templates for the command notifier, if one is configured.
    #[must_use]
    pub fn command_templates(&self) -> Option<CommandTemplates> {
        let fallback = self.notify_command.as_deref()?;
        Some(CommandTemplates {
            alert: self
                .notify_alert_command
                .as_deref()
                .map(CommandTemplates::split),
            fallback: Some(CommandTemplates::split(fallback)),
            ..CommandTemplates::default()
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}
