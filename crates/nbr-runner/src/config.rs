//! Run configuration.

use std::path::PathBuf;

use nbr_types::{config_error, OutputFormat, RunnerResult};
use serde::{Deserialize, Serialize};

/// Top-level configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Notebooks to execute, in command-line order.
    pub notebooks: Vec<PathBuf>,

    /// Optional parameter file; absent means one unparameterized run per
    /// notebook.
    pub parameter_file: Option<PathBuf>,

    /// Maximum number of jobs executing concurrently.
    pub workers: usize,

    /// Directory receiving rendered outputs; created if missing.
    pub output_dir: PathBuf,

    /// Re-execute jobs whose output already exists.
    pub overwrite: bool,

    pub format: OutputFormat,

    /// Cell execution timeout in seconds; <= 0 means unbounded.
    pub timeout_secs: i64,

    /// Tolerate engine-level cell errors.
    pub allow_errors: bool,

    /// Hide notebook code input in the rendered output.
    pub hide_input: bool,

    /// Pass the engine's debug flag through and log expanded tasks.
    pub debug: bool,

    /// Seconds to hold a global lock before each engine start, staggering
    /// concurrent kernel launches. 0 disables the stagger.
    pub locked_wait_secs: u64,

    /// Optional path receiving a JSON report of every job outcome.
    pub report_file: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new(notebooks: Vec<PathBuf>) -> Self {
        Self {
            notebooks,
            parameter_file: None,
            workers: 1,
            output_dir: PathBuf::from("."),
            overwrite: false,
            format: OutputFormat::default(),
            timeout_secs: -1,
            allow_errors: false,
            hide_input: false,
            debug: false,
            locked_wait_secs: 0,
            report_file: None,
        }
    }

    pub fn with_parameter_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.parameter_file = Some(path.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_timeout(mut self, seconds: i64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.notebooks.is_empty() {
            return Err(config_error!("at least one notebook is required"));
        }
        if self.workers < 1 {
            return Err(config_error!(
                "invalid worker count: {} (must be >= 1)",
                self.workers
            ));
        }
        Ok(())
    }
}
