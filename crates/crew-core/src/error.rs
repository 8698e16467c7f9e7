//! Error types for crew-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for crew operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for crew operations
///
/// Configuration-time errors (`Config`, `UnresolvedDependency`) abort a run
/// before any worker is invoked. Per-task errors (`Tool`, `Timeout`) are
/// retried and degrade to a task failure, isolated to the task's dependency
/// subtree. `PartialRunFailure` summarizes such a degraded run at the end.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad descriptor graph or crew configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A dependency references a task id that does not exist in the crew
    #[error("task '{task}' depends on unknown task '{missing}'")]
    UnresolvedDependency {
        task: String,
        missing: String,
    },

    /// A knowledge entry failed field validation
    #[error("invalid knowledge entry: {0}")]
    Validation(String),

    /// The knowledge store backend failed to load or persist entries
    #[error("storage error: {0}")]
    Storage(String),

    /// A worker/tool invocation failed
    #[error("tool invocation failed: {0}")]
    Tool(String),

    /// A task exceeded its wall-clock budget
    #[error("task timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The run finished, but some tasks failed and their dependents were skipped
    #[error("run finished with {} failed and {} skipped task(s)", failed.len(), skipped.len())]
    PartialRunFailure {
        failed: Vec<String>,
        skipped: Vec<String>,
    },
}

impl Error {
    /// Whether this error is transient and worth retrying
    ///
    /// Tool and timeout failures may succeed on a later attempt;
    /// configuration and validation failures never will.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Tool(_) | Self::Timeout(_))
    }
}
