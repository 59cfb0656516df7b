//! # nbr-types
//!
//! Core types and data structures for nbrunner: jobs, parameter sets,
//! output formats, and the error taxonomy shared by the runner and CLI.

mod errors;
mod format;
mod job;
mod params;

pub use errors::{FailureReason, RunnerError, RunnerResult};
pub use format::OutputFormat;
pub use job::{Job, JobOutcome, JobResult};
pub use params::{ParameterSet, OUTPUT_SUFFIX_KEY};
