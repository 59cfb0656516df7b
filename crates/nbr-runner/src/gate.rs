//! Output gate: the up-front skip/overwrite decision.

use std::fs;
use std::path::Path;

use nbr_types::{FailureReason, Job, JobOutcome, JobResult, RunnerResult};
use tracing::{debug, info};

/// Create the output directory (and parents). Idempotent: an existing
/// directory is not an error.
pub fn prepare_output_dir(dir: &Path) -> RunnerResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Partition jobs into runnable ones and already-settled results.
///
/// A job whose output exists is skipped unless `overwrite` is set. With
/// overwrite, a stale output is removed before execution, except when the
/// output path is the notebook itself, which flips the job to in-place
/// execution instead. The decision depends only on the filesystem state
/// at call time, never on concurrency, so it runs once before dispatch.
pub fn gate_jobs(jobs: Vec<Job>, overwrite: bool) -> (Vec<Job>, Vec<JobResult>) {
    let mut runnable = Vec::with_capacity(jobs.len());
    let mut settled = Vec::new();

    for mut job in jobs {
        if !job.output_path.exists() {
            runnable.push(job);
            continue;
        }

        if !overwrite {
            info!("Skip existing output file {}", job.output_path.display());
            settled.push(JobResult::skipped(job));
            continue;
        }

        if is_same_file(&job.notebook, &job.output_path) {
            debug!("Executing notebook {} in place", job.output_path.display());
            job.in_place = true;
            runnable.push(job);
            continue;
        }

        info!("Remove existing output file {}", job.output_path.display());
        match fs::remove_file(&job.output_path) {
            Ok(()) => runnable.push(job),
            Err(e) => {
                // The job cannot produce its output; fail it without
                // aborting the rest of the batch.
                let outcome = JobOutcome::Failed(FailureReason::Io(format!(
                    "cannot remove {}: {e}",
                    job.output_path.display()
                )));
                settled.push(JobResult {
                    job,
                    outcome,
                    duration: std::time::Duration::ZERO,
                });
            }
        }
    }

    (runnable, settled)
}

/// Whether two paths resolve to the same file. Unresolvable paths are
/// treated as distinct.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
