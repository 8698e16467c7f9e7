//! Execution context for tasks
//!
//! `TaskContext` carries everything a worker needs besides the descriptor
//! itself: the research subject, outputs of upstream tasks, and free-form
//! run inputs such as the current date.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known extra keys for common run inputs
pub mod keys {
    /// ISO date of the run (e.g. "2026-08-05")
    pub const CURRENT_DATE: &str = "current_date";
    /// Human-readable date (e.g. "August 5, 2026")
    pub const FULL_DATE: &str = "full_date";
    /// Full timestamp of run kickoff
    pub const TIMESTAMP: &str = "timestamp";
}

/// Context passed to workers during task execution
///
/// Upstream outputs are keyed by the producing task's id and only contain
/// tasks this one declared a dependency on. Extras hold untyped run inputs
/// with typed accessors for common fields.
///
/// # Example
///
/// ```
/// use crew_core::TaskContext;
///
/// let mut ctx = TaskContext::new("AAPL").with_current_date("2026-08-05");
/// ctx.add_input("screening", "Three candidates passed the screen.");
///
/// assert_eq!(ctx.subject(), "AAPL");
/// assert_eq!(ctx.current_date(), Some("2026-08-05"));
/// assert!(ctx.input("screening").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// What the crew is researching (ticker, market segment, ...)
    subject: String,
    /// Outputs of upstream tasks, keyed by task id
    inputs: HashMap<String, String>,
    /// Free-form run inputs
    extras: HashMap<String, serde_json::Value>,
}

impl TaskContext {
    /// Create a new context for a research subject
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// The research subject of the run
    pub fn subject(&self) -> &str {
        &self.subject
    }

    // =========== Upstream Outputs ===========

    /// Record the output of an upstream task
    pub fn add_input(&mut self, task_id: impl Into<String>, output: impl Into<String>) {
        self.inputs.insert(task_id.into(), output.into());
    }

    /// Get the output of an upstream task
    pub fn input(&self, task_id: &str) -> Option<&str> {
        self.inputs.get(task_id).map(String::as_str)
    }

    /// Iterate over all upstream outputs
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render upstream outputs as one prompt-ready block
    ///
    /// Sections are sorted by task id so the rendering is deterministic.
    pub fn joined_inputs(&self) -> String {
        let mut ids: Vec<&str> = self.inputs.keys().map(String::as_str).collect();
        ids.sort_unstable();

        let mut block = String::new();
        for id in ids {
            if !block.is_empty() {
                block.push_str("\n\n");
            }
            block.push_str(&format!("## {id}\n{}", self.inputs[id]));
        }
        block
    }

    // =========== Common Accessors ===========

    /// Set the run date
    pub fn with_current_date(mut self, date: impl Into<String>) -> Self {
        self.insert(keys::CURRENT_DATE, serde_json::json!(date.into()));
        self
    }

    /// Get the run date
    pub fn current_date(&self) -> Option<&str> {
        self.get(keys::CURRENT_DATE).and_then(|v| v.as_str())
    }

    /// Set the run kickoff timestamp
    pub fn with_timestamp(mut self, ts: impl Into<String>) -> Self {
        self.insert(keys::TIMESTAMP, serde_json::json!(ts.into()));
        self
    }

    /// Get the run kickoff timestamp
    pub fn timestamp(&self) -> Option<&str> {
        self.get(keys::TIMESTAMP).and_then(|v| v.as_str())
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the extras
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.extras.insert(key.into(), value);
    }

    /// Get a value from the extras
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extras.get(key)
    }

    /// Insert a typed value into the extras
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::Config(format!("failed to serialize context value: {e}"))
        })?;
        self.extras.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the extras
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.extras.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::Config(format!("failed to deserialize context value: {e}"))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if an extras key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }
}
