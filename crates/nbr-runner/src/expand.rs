//! Job expansion: the cartesian product of notebooks and parameter sets.

use std::path::Path;

use nbr_types::{Job, ParameterSet};

use crate::config::RunnerConfig;

/// Expand notebooks × parameter sets into the full job list.
///
/// Produces exactly `parameters.len() * notebooks.len()` jobs, parameter
/// sets in the outer loop and notebooks in the inner, so the sequence is
/// stable for a given invocation. Every output path is computed here,
/// before anything runs, which lets the skip decision happen up front.
///
/// Output filename rules, in precedence order:
/// - single run (exactly one, empty parameter set): `{stem}.{ext}`
/// - set defines `JUPYTER_OUTPUT_SUFFIX`: `{stem}_{suffix}.{ext}`
/// - otherwise: `{stem}_{i}.{ext}` with the set's 1-based line position
pub fn expand_jobs(config: &RunnerConfig, parameters: &[ParameterSet]) -> Vec<Job> {
    let single_run = parameters.len() == 1 && parameters[0].is_empty();

    let mut jobs = Vec::with_capacity(parameters.len() * config.notebooks.len());
    for (param_id, params) in parameters.iter().enumerate() {
        for notebook in &config.notebooks {
            let suffix = if single_run {
                String::new()
            } else if let Some(s) = params.output_suffix() {
                format!("_{s}")
            } else {
                format!("_{}", param_id + 1)
            };

            let extension = match config.format.extension() {
                Some(ext) => format!(".{ext}"),
                None => String::new(),
            };

            let output_name = format!("{}{}{}", notebook_stem(notebook), suffix, extension);
            jobs.push(Job {
                index: jobs.len() + 1,
                notebook: notebook.clone(),
                parameters: params.clone(),
                output_path: config.output_dir.join(output_name),
                format: config.format,
                timeout_secs: config.timeout_secs,
                allow_errors: config.allow_errors,
                hide_input: config.hide_input,
                debug: config.debug,
                in_place: false,
            });
        }
    }

    for job in &jobs {
        tracing::debug!(
            "Task {}: {} [{}] -> {}",
            job.index,
            job.notebook.display(),
            job.parameters,
            job.output_path.display()
        );
    }

    jobs
}

/// Notebook filename without directory or extension.
fn notebook_stem(notebook: &Path) -> String {
    notebook
        .file_stem()
        .unwrap_or(notebook.as_os_str())
        .to_string_lossy()
        .into_owned()
}
