//! Result aggregation, summary output and the exit-code policy.

use std::fs;
use std::path::Path;

use nbr_types::{JobOutcome, JobResult, RunnerResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Aggregated outcome of a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub results: Vec<JobResult>,
}

/// One job's outcome in the machine-readable report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub task: usize,
    pub notebook: String,
    pub output: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_secs: f64,
}

impl RunReport {
    pub fn new(mut results: Vec<JobResult>) -> Self {
        results.sort_by_key(|r| r.job.index);
        Self { results }
    }

    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Succeeded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == JobOutcome::Skipped)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failed())
            .count()
    }

    /// Non-zero iff at least one job failed. Skipped and succeeded jobs
    /// never contribute.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            1
        } else {
            0
        }
    }

    /// Log one human-readable line per job plus a totals line.
    pub fn log_summary(&self) {
        for result in &self.results {
            let path = result.job.output_path.display();
            match &result.outcome {
                JobOutcome::Skipped => info!("[skipped] {path}"),
                JobOutcome::Succeeded { warning: None } => {
                    info!("[ok] {path} ({:.1}s)", result.duration.as_secs_f64())
                }
                JobOutcome::Succeeded {
                    warning: Some(warning),
                } => info!(
                    "[ok] {path} ({:.1}s): {warning}",
                    result.duration.as_secs_f64()
                ),
                JobOutcome::Failed(reason) => error!("[failed] {path}: {reason}"),
            }
        }
        info!(
            "{} succeeded, {} skipped, {} failed",
            self.succeeded(),
            self.skipped(),
            self.failed()
        );
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.results
            .iter()
            .map(|result| {
                let (warning, reason) = match &result.outcome {
                    JobOutcome::Succeeded { warning } => (warning.clone(), None),
                    JobOutcome::Failed(r) => (None, Some(r.to_string())),
                    JobOutcome::Skipped => (None, None),
                };
                ReportEntry {
                    task: result.job.index,
                    notebook: result.job.notebook.to_string_lossy().into_owned(),
                    output: result.job.output_path.to_string_lossy().into_owned(),
                    status: result.outcome.label().to_string(),
                    warning,
                    reason,
                    duration_secs: result.duration.as_secs_f64(),
                }
            })
            .collect()
    }

    /// Write the per-job outcomes as a JSON document.
    pub fn write_json(&self, path: &Path) -> RunnerResult<()> {
        let json = serde_json::to_string_pretty(&self.entries())?;
        fs::write(path, json)?;
        info!("Wrote report to {}", path.display());
        Ok(())
    }
}
