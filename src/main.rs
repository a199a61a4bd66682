//! Binary entry point for the `suiterun` CLI.

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use suiterun::notifier::{CommandNotifier, CommandTemplates, GroupedNotifiers, StdioNotifier};
use suiterun::report::{self, EXIT_FAILURE, EXIT_SUCCESS};
use suiterun::{
    Aggregator, AggregatorConfig, ConfigError, DiscoveryError, Job, NotifierError,
    ProcessCommandRunner, StreamingCommandRunner, discover,
};

mod cli;

use cli::Cli;

const LOG_ENV_VAR: &str = "SUITERUN_LOG";
const NOTIFY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("job discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("notification setup failed: {0}")]
    Notifier(#[from] NotifierError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let exit_code = match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            EXIT_FAILURE
        }
    };

    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn dispatch(cli: &Cli) -> Result<i32, CliError> {
    let config = resolve_config(cli)?;
    let jobs = discover(&config.jobs_root(), config.discovery_mode())?;

    if cli.list {
        write_job_list(io::stdout().lock(), &jobs)?;
        return Ok(EXIT_SUCCESS);
    }

    let notifier = build_notifier(&config)?;
    let timeout = config.job_timeout();
    let run = if config.stream_output {
        let runner = StreamingCommandRunner::new().with_timeout(timeout);
        Aggregator::new(runner, &notifier).run_all(&jobs)
    } else {
        let runner = ProcessCommandRunner::new().with_timeout(timeout);
        Aggregator::new(runner, &notifier).run_all(&jobs)
    };

    Ok(report::report(&run, &notifier))
}

fn resolve_config(cli: &Cli) -> Result<AggregatorConfig, CliError> {
    let mut config = AggregatorConfig::load_without_cli_args()?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut AggregatorConfig, cli: &Cli) {
    if let Some(dir) = &cli.jobs_dir {
        config.jobs_dir.clone_from(dir);
    }
    if cli.recursive {
        config.recursive = true;
    }
    if let Some(secs) = cli.timeout {
        config.job_timeout_secs = Some(secs);
    }
    if cli.verbose {
        config.verbose = true;
    }
    if cli.quiet {
        config.verbose = false;
    }
}

fn build_notifier(config: &AggregatorConfig) -> Result<GroupedNotifiers, CliError> {
    let mut notifier = GroupedNotifiers::default();
    notifier.set_quiet(!config.verbose);
    notifier.push(StdioNotifier::new(config.color_choice()?));

    let runner = ProcessCommandRunner::new().with_timeout(Some(NOTIFY_COMMAND_TIMEOUT));
    if config.notify_send {
        notifier.push(CommandNotifier::new(CommandTemplates::notify_send(), runner)?);
    }
    if let Some(templates) = config.command_templates() {
        notifier.push(CommandNotifier::new(templates, runner)?);
    }

    Ok(notifier)
}

fn write_job_list(mut target: impl Write, jobs: &[Job]) -> io::Result<()> {
    for job in jobs {
        writeln!(target, "{job}")?;
    }
    target.flush()
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
