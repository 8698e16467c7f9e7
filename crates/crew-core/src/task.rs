//! Task descriptor model
//!
//! A `TaskDescriptor` is one unit of work in a crew: an assigned agent, the
//! tasks it depends on, whether it may run concurrently with its sequential
//! neighbors, and where its output goes. Descriptors are value objects
//! constructed from parsed configuration; validation of the graph they form
//! lives in the workflow crate.

use crate::category::Category;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named reference to a configured agent
///
/// Resolution to an actual role/goal/backstory definition happens in the
/// external worker layer; the core only routes by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentRef {
    /// Agent name as declared in configuration (e.g. "market_analyst")
    pub name: String,
}

impl AgentRef {
    /// Create a new agent reference
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A unit of work assigned to an agent within a crew
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Identifier, unique within the crew
    pub id: String,

    /// The agent responsible for this task
    pub agent: AgentRef,

    /// Ids of tasks whose outputs this task consumes (must form a DAG)
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Whether this task may execute concurrently in a sequential chain
    ///
    /// The terminal task of a sequential crew must leave this false.
    #[serde(default)]
    pub allow_concurrent: bool,

    /// Category the task's output is stored under in the knowledge store
    pub category: Category,

    /// Logical output target (e.g. a report artifact name)
    pub output_target: String,
}

impl TaskDescriptor {
    /// Create a new descriptor builder
    ///
    /// # Arguments
    ///
    /// * `id` - Task identifier, unique within its crew
    /// * `agent` - Name of the agent assigned to the task
    pub fn builder(id: impl Into<String>, agent: impl Into<String>) -> TaskDescriptorBuilder {
        TaskDescriptorBuilder::new(id, agent)
    }
}

/// Builder for constructing task descriptors
#[derive(Debug)]
pub struct TaskDescriptorBuilder {
    id: String,
    agent: AgentRef,
    depends_on: Vec<String>,
    allow_concurrent: bool,
    category: Option<Category>,
    output_target: Option<String>,
}

impl TaskDescriptorBuilder {
    /// Create a new builder
    pub fn new(id: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent: AgentRef::new(agent),
            depends_on: Vec::new(),
            allow_concurrent: false,
            category: None,
            output_target: None,
        }
    }

    /// Add a dependency on another task's output
    pub fn depends_on(mut self, task_id: impl Into<String>) -> Self {
        self.depends_on.push(task_id.into());
        self
    }

    /// Allow the task to run concurrently within a sequential chain
    pub fn allow_concurrent(mut self, allow: bool) -> Self {
        self.allow_concurrent = allow;
        self
    }

    /// Set the knowledge category of the task's output
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the logical output target
    pub fn output_target(mut self, target: impl Into<String>) -> Self {
        self.output_target = Some(target.into());
        self
    }

    /// Build the descriptor
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the id is empty or no category was set.
    pub fn build(self) -> Result<TaskDescriptor> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("task id must not be empty".to_string()));
        }
        let category = self
            .category
            .ok_or_else(|| Error::Config(format!("task '{}' has no category", self.id)))?;

        let output_target = self
            .output_target
            .unwrap_or_else(|| format!("{}.md", self.id));

        Ok(TaskDescriptor {
            id: self.id,
            agent: self.agent,
            depends_on: self.depends_on,
            allow_concurrent: self.allow_concurrent,
            category,
            output_target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let task = TaskDescriptor::builder("market_analysis", "market_analyst")
            .category(Category::MarketData)
            .build()
            .unwrap();

        assert_eq!(task.id, "market_analysis");
        assert_eq!(task.agent.name, "market_analyst");
        assert!(task.depends_on.is_empty());
        assert!(!task.allow_concurrent);
        assert_eq!(task.output_target, "market_analysis.md");
    }

    #[test]
    fn test_builder_chain() {
        let task = TaskDescriptor::builder("risk_assessment", "risk_assessor")
            .depends_on("screening")
            .depends_on("detail")
            .allow_concurrent(true)
            .category(Category::Risk)
            .output_target("risk_profile.md")
            .build()
            .unwrap();

        assert_eq!(task.depends_on, vec!["screening", "detail"]);
        assert!(task.allow_concurrent);
        assert_eq!(task.output_target, "risk_profile.md");
    }

    #[test]
    fn test_builder_rejects_empty_id() {
        let result = TaskDescriptor::builder("  ", "analyst")
            .category(Category::Report)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_requires_category() {
        let result = TaskDescriptor::builder("synthesis", "director").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let task = TaskDescriptor::builder("strategy", "strategist")
            .depends_on("risk_assessment")
            .category(Category::Strategy)
            .build()
            .unwrap();

        let json = serde_json::to_string(&task).unwrap();
        let parsed: TaskDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, task.id);
        assert_eq!(parsed.category, Category::Strategy);
        assert_eq!(parsed.depends_on, task.depends_on);
    }
}
