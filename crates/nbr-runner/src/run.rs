//! Whole-run orchestration: parse, expand, gate, dispatch, aggregate.

use std::sync::Arc;
use std::time::Duration;

use nbr_types::RunnerResult;
use tracing::info;

use crate::config::RunnerConfig;
use crate::dispatch::Dispatcher;
use crate::engine::{NbconvertEngine, NotebookEngine};
use crate::expand::expand_jobs;
use crate::gate::{gate_jobs, prepare_output_dir};
use crate::params::parse_parameter_file;
use crate::report::RunReport;

/// Execute a full batch run with the production nbconvert engine.
pub async fn run(config: &RunnerConfig) -> RunnerResult<RunReport> {
    run_with_engine(config, Arc::new(NbconvertEngine::new())).await
}

/// Execute a full batch run against an arbitrary engine.
///
/// Configuration and parameter-file errors abort here, before any job is
/// expanded or dispatched. Everything after that point is a per-job
/// outcome inside the returned report.
pub async fn run_with_engine(
    config: &RunnerConfig,
    engine: Arc<dyn NotebookEngine>,
) -> RunnerResult<RunReport> {
    config.validate()?;

    let parameters = parse_parameter_file(config.parameter_file.as_deref())?;
    let jobs = expand_jobs(config, &parameters);
    info!(
        "Expanded {} job(s): {} notebook(s) x {} parameter set(s)",
        jobs.len(),
        config.notebooks.len(),
        parameters.len()
    );

    prepare_output_dir(&config.output_dir)?;
    let (runnable, settled) = gate_jobs(jobs, config.overwrite);

    let dispatcher = Dispatcher::new(engine, config.workers)
        .with_locked_wait(Duration::from_secs(config.locked_wait_secs));
    let mut results = dispatcher.run(runnable).await;
    results.extend(settled);

    let report = RunReport::new(results);
    if let Some(path) = &config.report_file {
        report.write_json(path)?;
    }
    Ok(report)
}
