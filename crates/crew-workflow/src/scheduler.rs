//! Dependency resolver and batch scheduler
//!
//! Layers a crew's dependency DAG into ordered execution batches: every
//! task's dependencies lie in strictly earlier batches, and a batch is a
//! synchronization barrier for the coordinator.

use crate::crew::{Crew, CrewPolicy};
use crate::validate;
use crew_core::Result;
use std::collections::HashSet;
use tracing::debug;

/// Tasks scheduled to execute together, bounded by a barrier
///
/// Order within a batch is declaration order in the crew configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionBatch {
    /// Task ids in this batch
    pub tasks: Vec<String>,
}

/// An ordered sequence of batches for one crew run
///
/// Owned transiently by the coordinator for the duration of a run and
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    batches: Vec<ExecutionBatch>,
}

impl ExecutionPlan {
    /// The batches, in execution order
    pub fn batches(&self) -> &[ExecutionBatch] {
        &self.batches
    }

    /// Number of batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the plan contains no batches
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Orders a crew's tasks into execution batches
pub struct Scheduler;

impl Scheduler {
    /// Produce the execution plan for a crew
    ///
    /// Validates the crew first, so an invalid graph never reaches
    /// execution. For parallel crews, batch *k* contains every task whose
    /// dependencies are fully contained in batches `0..k-1` - the minimum
    /// number of batches, hence maximum available parallelism. For
    /// sequential crews, one task per batch in declaration order.
    ///
    /// A task with `allow_concurrent = false` sharing a batch with siblings
    /// still executes concurrently with them; the flag governs only the
    /// sequential-chain invariant, not intra-batch concurrency.
    pub fn plan(crew: &Crew) -> Result<ExecutionPlan> {
        validate::validate(crew)?;

        let batches = match crew.policy {
            CrewPolicy::Sequential => crew
                .tasks
                .iter()
                .map(|t| ExecutionBatch {
                    tasks: vec![t.id.clone()],
                })
                .collect(),
            CrewPolicy::Parallel => layer(crew),
        };

        debug!(
            crew = %crew.name,
            tasks = crew.tasks.len(),
            batches = batches.len(),
            "execution plan ready"
        );

        Ok(ExecutionPlan { batches })
    }
}

/// Topological layering, stable by declaration order within a batch
fn layer(crew: &Crew) -> Vec<ExecutionBatch> {
    let mut scheduled: HashSet<&str> = HashSet::new();
    let mut batches = Vec::new();

    while scheduled.len() < crew.tasks.len() {
        let ready: Vec<&str> = crew
            .tasks
            .iter()
            .filter(|t| !scheduled.contains(t.id.as_str()))
            .filter(|t| t.depends_on.iter().all(|d| scheduled.contains(d.as_str())))
            .map(|t| t.id.as_str())
            .collect();

        // The crew was validated acyclic, so every pass frees at least one task
        if ready.is_empty() {
            break;
        }

        scheduled.extend(ready.iter().copied());
        batches.push(ExecutionBatch {
            tasks: ready.into_iter().map(str::to_string).collect(),
        });
    }

    batches
}
