//! # nbr-runner
//!
//! Batch execution of notebooks across the cartesian product of notebooks
//! and parameter sets, with bounded worker parallelism.
//!
//! Provides parameter-file parsing, job expansion with deterministic output
//! naming, the up-front skip/overwrite gate, a fixed-size worker pool over a
//! static job queue, and result aggregation with the exit-code policy.
//! Actual notebook execution is delegated to an external engine behind the
//! [`NotebookEngine`] trait; the production implementation shells out to
//! `jupyter nbconvert`.

mod config;
mod dispatch;
mod engine;
mod expand;
mod gate;
mod params;
mod report;
mod run;

pub use config::RunnerConfig;
pub use dispatch::Dispatcher;
pub use engine::{EngineOutcome, NbconvertEngine, NotebookEngine};
pub use expand::expand_jobs;
pub use gate::{gate_jobs, prepare_output_dir};
pub use params::parse_parameter_file;
pub use report::{ReportEntry, RunReport};
pub use run::{run, run_with_engine};
