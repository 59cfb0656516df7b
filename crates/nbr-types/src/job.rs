//! Job descriptors and per-job outcomes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{FailureReason, OutputFormat, ParameterSet};

/// One (notebook, parameter-set) execution unit with a precomputed output
/// path. Created once at expansion time, immutable afterwards, consumed
/// exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// 1-based position in the expanded job sequence.
    pub index: usize,
    pub notebook: PathBuf,
    pub parameters: ParameterSet,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    /// Cell execution timeout in seconds; values <= 0 mean unbounded.
    pub timeout_secs: i64,
    pub allow_errors: bool,
    pub hide_input: bool,
    pub debug: bool,
    /// Set by the output gate when the output path is the notebook itself.
    pub in_place: bool,
}

impl Job {
    /// Effective execution timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs > 0 {
            Some(Duration::from_secs(self.timeout_secs as u64))
        } else {
            None
        }
    }
}

/// Terminal status of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Output already existed and overwrite was not requested.
    Skipped,
    Succeeded {
        /// Annotation attached when engine-level errors were tolerated.
        warning: Option<String>,
    },
    Failed(FailureReason),
}

impl JobOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short status word for summary lines and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Succeeded { .. } => "ok",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome of a single job, produced by the dispatcher and consumed by the
/// result aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub job: Job,
    pub outcome: JobOutcome,
    pub duration: Duration,
}

impl JobResult {
    pub fn skipped(job: Job) -> Self {
        Self {
            job,
            outcome: JobOutcome::Skipped,
            duration: Duration::ZERO,
        }
    }
}
