//! Crew definition
//!
//! A crew is a named group of tasks researching one subject toward one
//! report. Declaration order is significant: it is the scheduling tie-break
//! within a batch, and for sequential crews it is the execution order.

use crate::validate;
use crew_core::{Result, TaskDescriptor};
use serde::{Deserialize, Serialize};

/// Scheduling policy of a crew
///
/// Policy is a per-crew parameter; crews with different policies compose
/// freely within one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewPolicy {
    /// One task per batch, in declaration order; the last task must be
    /// synchronous (`allow_concurrent = false`)
    Sequential,
    /// Dependency-driven batches with maximum available parallelism
    Parallel,
}

/// A named group of tasks producing one report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crew {
    /// Crew name (e.g. "stock_crew")
    pub name: String,
    /// Scheduling policy
    pub policy: CrewPolicy,
    /// Tasks in declaration order
    pub tasks: Vec<TaskDescriptor>,
}

impl Crew {
    /// Create a new crew builder
    pub fn builder(name: impl Into<String>, policy: CrewPolicy) -> CrewBuilder {
        CrewBuilder::new(name, policy)
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The last declared task, whose output is the crew's report artifact
    pub fn terminal_task(&self) -> Option<&TaskDescriptor> {
        self.tasks.last()
    }
}

/// Builder for constructing crews
///
/// `build` validates the descriptor graph, so a malformed crew is rejected
/// at configuration load - before any tool or LLM call is paid for.
pub struct CrewBuilder {
    name: String,
    policy: CrewPolicy,
    tasks: Vec<TaskDescriptor>,
}

impl CrewBuilder {
    /// Create a new crew builder
    pub fn new(name: impl Into<String>, policy: CrewPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            tasks: Vec::new(),
        }
    }

    /// Add a task to the crew
    pub fn add_task(mut self, task: TaskDescriptor) -> Self {
        self.tasks.push(task);
        self
    }

    /// Build and validate the crew
    ///
    /// # Errors
    ///
    /// `Error::Config` for duplicate ids, cycles, or a concurrent terminal
    /// task in a sequential crew; `Error::UnresolvedDependency` for a
    /// dependency on an unknown task id.
    pub fn build(self) -> Result<Crew> {
        let crew = Crew {
            name: self.name,
            policy: self.policy,
            tasks: self.tasks,
        };
        validate::validate(&crew)?;
        Ok(crew)
    }
}
