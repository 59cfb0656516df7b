use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the nbrunner system.
///
/// These are process-level errors: every variant aborts the run before any
/// job is dispatched. Per-job failures are modeled separately as
/// [`FailureReason`] so one bad notebook never takes down the batch.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parameter file error: {path}:{line}: {message}")]
    ParameterFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Terminal failure reason for a single job.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    #[error("execution exceeded timeout of {seconds}s")]
    Timeout { seconds: u64 },

    #[error("engine exited with status {exit_code:?}: {message}")]
    Engine {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("io error: {0}")]
    Io(String),
}

/// Result type alias for nbrunner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::RunnerError::Config(format!($($arg)*))
    };
}
