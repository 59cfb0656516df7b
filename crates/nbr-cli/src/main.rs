//! The `nbrunner` binary: argument parsing, logging setup, exit code.

use std::path::PathBuf;

use clap::Parser;
use nbr_runner::RunnerConfig;
use nbr_types::OutputFormat;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "nbrunner", version)]
#[clap(about = "Execute notebooks across parameter sets with bounded parallelism")]
struct Args {
    /// Notebook files to execute
    #[clap(required = true, value_name = "NOTEBOOK")]
    notebooks: Vec<PathBuf>,

    /// Parameter file with one set of KEY=VALUE pairs per line, setting
    /// the environment of each execution
    #[clap(long, value_name = "PATH")]
    parameter_file: Option<PathBuf>,

    /// Maximum number of parallel executions
    #[clap(long, default_value_t = 1, value_name = "N")]
    workers: usize,

    /// Output directory, created if missing
    #[clap(long, default_value = ".", value_name = "DIR")]
    output_directory: PathBuf,

    /// Overwrite output files if they already exist
    #[clap(long)]
    overwrite: bool,

    /// Output format: html, notebook, pdf...
    #[clap(long, default_value = "html", value_name = "FORMAT")]
    format: String,

    /// Cell execution timeout in seconds, -1 meaning unbounded
    #[clap(
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        value_name = "SECONDS"
    )]
    timeout: i64,

    /// Allow errors during notebook execution
    #[clap(long)]
    allow_errors: bool,

    /// Hide notebook code input in the rendered output
    #[clap(long)]
    hide_input: bool,

    /// Seconds to hold a global lock before each execution starts,
    /// staggering concurrent kernel launches
    #[clap(long, default_value_t = 0, value_name = "SECONDS")]
    locked_wait: u64,

    /// Write a JSON report of every job outcome to this path
    #[clap(long, value_name = "PATH")]
    report_file: Option<PathBuf>,

    /// Enable debug logs
    #[clap(long)]
    debug: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RunnerConfig> {
        let format: OutputFormat = self.format.parse()?;
        let mut config = RunnerConfig::new(self.notebooks)
            .with_workers(self.workers)
            .with_output_dir(self.output_directory)
            .with_format(format)
            .with_overwrite(self.overwrite)
            .with_timeout(self.timeout);
        config.parameter_file = self.parameter_file;
        config.allow_errors = self.allow_errors;
        config.hide_input = self.hide_input;
        config.debug = self.debug;
        config.locked_wait_secs = self.locked_wait;
        config.report_file = self.report_file;
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    debug!("Running notebook(s) with arguments: {args:?}");

    let config = args.into_config()?;
    let report = nbr_runner::run(&config).await?;
    report.log_summary();
    std::process::exit(report.exit_code());
}
