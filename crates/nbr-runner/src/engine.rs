//! Execution engine boundary.
//!
//! The runner never parses or renders notebooks itself; it shells out to
//! `jupyter nbconvert` with a per-job environment snapshot. The trait seam
//! keeps the dispatcher testable without a Jupyter installation.

use async_trait::async_trait;
use nbr_types::{FailureReason, Job};
use tokio::process::Command;
use tracing::info;

/// Terminal outcome reported by an engine for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    Success,
    Failed(FailureReason),
}

/// An external notebook-execution engine.
///
/// Implementations must encode every failure in the returned outcome;
/// nothing may unwind past the worker that invoked them.
#[async_trait]
pub trait NotebookEngine: Send + Sync {
    async fn execute(&self, job: &Job) -> EngineOutcome;
}

/// Production engine invoking `jupyter nbconvert --execute`.
#[derive(Debug, Clone)]
pub struct NbconvertEngine {
    program: String,
}

impl NbconvertEngine {
    pub fn new() -> Self {
        Self {
            program: "jupyter".to_string(),
        }
    }

    /// Override the invoked program. Used by tests to substitute a stub.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Argument vector for one job, in nbconvert's expected shape.
    pub fn build_args(&self, job: &Job) -> Vec<String> {
        let mut args = vec![
            "nbconvert".to_string(),
            "--execute".to_string(),
            "--output".to_string(),
            job.output_path.to_string_lossy().into_owned(),
            "--to".to_string(),
            job.format.to_string(),
        ];

        if job.format.executes() {
            args.push(format!("--ExecutePreprocessor.timeout={}", job.timeout_secs));
        }
        if job.debug {
            args.push("--debug".to_string());
        }
        if job.hide_input {
            args.push("--TemplateExporter.exclude_input=True".to_string());
        }
        if job.in_place {
            args.push("--inplace".to_string());
        }
        if job.allow_errors {
            args.push("--allow-errors".to_string());
        }

        args.push(job.notebook.to_string_lossy().into_owned());
        args
    }
}

impl Default for NbconvertEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotebookEngine for NbconvertEngine {
    async fn execute(&self, job: &Job) -> EngineOutcome {
        let args = self.build_args(job);
        info!(
            "Executing command: {} {} with parameters: {}",
            self.program,
            args.join(" "),
            job.parameters
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&args).envs(job.parameters.iter());
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return EngineOutcome::Failed(FailureReason::Io(format!(
                    "cannot spawn {}: {e}",
                    self.program
                )))
            }
        };

        let status = match job.timeout() {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_elapsed) => {
                    let _ = child.kill().await;
                    return EngineOutcome::Failed(FailureReason::Timeout {
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait().await,
        };

        match status {
            Ok(status) if status.success() => EngineOutcome::Success,
            Ok(status) => EngineOutcome::Failed(FailureReason::Engine {
                exit_code: status.code(),
                message: format!("{} exited with {status}", self.program),
            }),
            Err(e) => EngineOutcome::Failed(FailureReason::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use nbr_types::{OutputFormat, ParameterSet};

    use super::*;

    fn sample_job(format: OutputFormat) -> Job {
        Job {
            index: 1,
            notebook: PathBuf::from("a.ipynb"),
            parameters: ParameterSet::new(),
            output_path: PathBuf::from("out/a.html"),
            format,
            timeout_secs: -1,
            allow_errors: false,
            hide_input: false,
            debug: false,
            in_place: false,
        }
    }

    #[test]
    fn args_cover_the_basic_invocation() {
        let engine = NbconvertEngine::new();
        let args = engine.build_args(&sample_job(OutputFormat::Html));
        assert_eq!(
            args,
            vec![
                "nbconvert",
                "--execute",
                "--output",
                "out/a.html",
                "--to",
                "html",
                "--ExecutePreprocessor.timeout=-1",
                "a.ipynb",
            ]
        );
    }

    #[test]
    fn source_dump_formats_skip_the_timeout_flag() {
        let engine = NbconvertEngine::new();
        let args = engine.build_args(&sample_job(OutputFormat::Python));
        assert!(!args.iter().any(|a| a.starts_with("--ExecutePreprocessor")));
    }

    #[test]
    fn optional_flags_appear_before_the_notebook() {
        let engine = NbconvertEngine::new();
        let mut job = sample_job(OutputFormat::Html);
        job.timeout_secs = 60;
        job.allow_errors = true;
        job.hide_input = true;
        job.in_place = true;
        job.debug = true;

        let args = engine.build_args(&job);
        assert!(args.contains(&"--ExecutePreprocessor.timeout=60".to_string()));
        assert!(args.contains(&"--debug".to_string()));
        assert!(args.contains(&"--TemplateExporter.exclude_input=True".to_string()));
        assert!(args.contains(&"--inplace".to_string()));
        assert!(args.contains(&"--allow-errors".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("a.ipynb"));
    }

    #[tokio::test]
    async fn successful_process_is_a_success() {
        let engine = NbconvertEngine::with_program("true");
        let outcome = engine.execute(&sample_job(OutputFormat::Html)).await;
        assert_eq!(outcome, EngineOutcome::Success);
    }

    #[tokio::test]
    async fn failing_process_reports_the_exit_code() {
        let engine = NbconvertEngine::with_program("false");
        let outcome = engine.execute(&sample_job(OutputFormat::Html)).await;
        match outcome {
            EngineOutcome::Failed(FailureReason::Engine { exit_code, .. }) => {
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unspawnable_program_is_an_io_failure() {
        let engine = NbconvertEngine::with_program("/nonexistent/jupyter");
        let outcome = engine.execute(&sample_job(OutputFormat::Html)).await;
        assert!(matches!(
            outcome,
            EngineOutcome::Failed(FailureReason::Io(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn overrunning_process_is_killed_and_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = NbconvertEngine::with_program(script.to_string_lossy());
        let mut job = sample_job(OutputFormat::Html);
        job.timeout_secs = 1;

        let started = std::time::Instant::now();
        let outcome = engine.execute(&job).await;
        assert_eq!(
            outcome,
            EngineOutcome::Failed(FailureReason::Timeout { seconds: 1 })
        );
        // Killed at the deadline, not after the script's full sleep
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
