//! Crew execution coordinator
//!
//! Executes a crew's batches in order. Within a batch every task is spawned
//! and awaited before the next batch starts, so the batch boundary is both a
//! scheduling barrier and a knowledge-store visibility fence: entries written
//! by batch *k* are guaranteed visible to queries from batch *k+1*.

use crate::cancel::CancelToken;
use crate::crew::Crew;
use crate::retry::RetryPolicy;
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use crew_core::{Error, Result, TaskContext, Worker};
use crew_knowledge::{KnowledgeEntry, KnowledgeStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for crew execution
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Retry policy applied to every task invocation
    pub retry: RetryPolicy,

    /// Wall-clock budget per task invocation attempt
    pub task_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            task_timeout: Duration::from_secs(300),
        }
    }
}

/// Terminal state of one task in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// The task completed and produced this output
    Succeeded(String),
    /// The task failed after exhausting retries
    Failed(String),
    /// The task never ran: a dependency failed or the run was cancelled
    Skipped,
}

impl TaskOutcome {
    /// Whether this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// The task's output, if it succeeded
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Succeeded(output) => Some(output),
            _ => None,
        }
    }
}

/// Final summary of one crew run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewReport {
    /// Unique id of the run
    pub run_id: Uuid,
    /// Crew that ran
    pub crew: String,
    /// Research subject of the run
    pub subject: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Whether the run was cancelled before completing
    pub cancelled: bool,
    /// Output of the terminal task, if it succeeded
    pub final_output: Option<String>,
    /// Per-task outcomes, in declaration order
    outcomes: Vec<(String, TaskOutcome)>,
}

impl CrewReport {
    /// Outcome of a specific task
    pub fn outcome(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == task_id)
            .map(|(_, outcome)| outcome)
    }

    /// Iterate over all outcomes in declaration order
    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &TaskOutcome)> {
        self.outcomes.iter().map(|(id, o)| (id.as_str(), o))
    }

    /// Ids of tasks that succeeded
    pub fn succeeded(&self) -> Vec<&str> {
        self.ids_where(TaskOutcome::is_success)
    }

    /// Ids of tasks that failed
    pub fn failed(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, TaskOutcome::Failed(_)))
    }

    /// Ids of tasks that were skipped
    pub fn skipped(&self) -> Vec<&str> {
        self.ids_where(|o| matches!(o, TaskOutcome::Skipped))
    }

    /// Whether every task succeeded and the run was not cancelled
    ///
    /// An incomplete report still carries whatever outputs were produced;
    /// downstream report generation decides how to flag the gaps.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(|(_, o)| o.is_success())
    }

    /// Convert a partially failed run into an error
    ///
    /// # Errors
    ///
    /// `Error::PartialRunFailure` listing failed and skipped tasks when any
    /// task did not succeed.
    pub fn into_result(self) -> Result<Self> {
        let failed: Vec<String> = self.failed().iter().map(|s| (*s).to_string()).collect();
        let skipped: Vec<String> = self.skipped().iter().map(|s| (*s).to_string()).collect();

        if failed.is_empty() && skipped.is_empty() {
            Ok(self)
        } else {
            Err(Error::PartialRunFailure { failed, skipped })
        }
    }

    fn ids_where(&self, predicate: impl Fn(&TaskOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| predicate(o))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// In-flight state of one crew execution
///
/// Created at kickoff, mutated as batches complete, and consumed into a
/// `CrewReport` when the terminal batch finishes or the run is cut short.
struct CrewRun {
    id: Uuid,
    crew: String,
    subject: String,
    started_at: DateTime<Utc>,
    cancelled: bool,
    outcomes: HashMap<String, TaskOutcome>,
}

impl CrewRun {
    fn new(crew: &Crew, subject: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            crew: crew.name.clone(),
            subject: subject.to_string(),
            started_at: Utc::now(),
            cancelled: false,
            outcomes: HashMap::new(),
        }
    }

    fn record(&mut self, task_id: impl Into<String>, outcome: TaskOutcome) {
        self.outcomes.insert(task_id.into(), outcome);
    }

    /// Output of a task, if it has succeeded so far
    fn output_of(&self, task_id: &str) -> Option<&str> {
        self.outcomes.get(task_id).and_then(TaskOutcome::output)
    }

    fn finalize(mut self, crew: &Crew) -> CrewReport {
        let final_output = crew
            .terminal_task()
            .and_then(|t| self.output_of(&t.id))
            .map(str::to_string);

        let outcomes: Vec<(String, TaskOutcome)> = crew
            .tasks
            .iter()
            .map(|t| {
                let outcome = self
                    .outcomes
                    .remove(&t.id)
                    .unwrap_or(TaskOutcome::Skipped);
                (t.id.clone(), outcome)
            })
            .collect();

        CrewReport {
            run_id: self.id,
            crew: self.crew,
            subject: self.subject,
            started_at: self.started_at,
            finished_at: Utc::now(),
            cancelled: self.cancelled,
            final_output,
            outcomes,
        }
    }
}

/// How a single spawned invocation ended
enum Invocation {
    Completed(String),
    Failed(String),
    Cancelled,
}

/// Runs crews batch by batch against a worker and the shared knowledge store
///
/// # Example
///
/// ```no_run
/// use crew_workflow::{Crew, CrewCoordinator, CrewPolicy};
/// use crew_core::TaskContext;
/// use crew_knowledge::KnowledgeStore;
/// use std::sync::Arc;
///
/// # async fn example(worker: Arc<dyn crew_core::Worker>) -> crew_core::Result<()> {
/// let store = KnowledgeStore::default();
/// let coordinator = CrewCoordinator::new(worker, store);
///
/// # let crew = Crew::builder("stock_crew", CrewPolicy::Sequential).build()?;
/// let report = coordinator.run(&crew, TaskContext::new("AAPL")).await?;
/// println!("{} task(s) succeeded", report.succeeded().len());
/// # Ok(())
/// # }
/// ```
pub struct CrewCoordinator {
    worker: Arc<dyn Worker>,
    store: KnowledgeStore,
    config: CoordinatorConfig,
}

impl CrewCoordinator {
    /// Create a coordinator with the default configuration
    pub fn new(worker: Arc<dyn Worker>, store: KnowledgeStore) -> Self {
        Self::with_config(worker, store, CoordinatorConfig::default())
    }

    /// Create a coordinator with an explicit configuration
    pub fn with_config(
        worker: Arc<dyn Worker>,
        store: KnowledgeStore,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            worker,
            store,
            config,
        }
    }

    /// The shared knowledge store
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Execute a crew to completion
    ///
    /// # Arguments
    ///
    /// * `crew` - The crew to run
    /// * `context` - Base context (subject and run inputs) handed to every task
    ///
    /// # Errors
    ///
    /// Configuration errors from scheduling. Per-task failures do not fail
    /// the run; they are reported in the returned `CrewReport`.
    pub async fn run(&self, crew: &Crew, context: TaskContext) -> Result<CrewReport> {
        self.run_with_cancel(crew, context, CancelToken::new())
            .await
    }

    /// Execute a crew with an external cancellation handle
    ///
    /// Cancelling interrupts in-flight tasks of the current batch and skips
    /// all later batches; knowledge entries already written are retained.
    pub async fn run_with_cancel(
        &self,
        crew: &Crew,
        context: TaskContext,
        cancel: CancelToken,
    ) -> Result<CrewReport> {
        let plan = Scheduler::plan(crew)?;
        let mut run = CrewRun::new(crew, context.subject());

        info!(
            crew = %crew.name,
            run_id = %run.id,
            batches = plan.len(),
            "starting crew run"
        );

        for (batch_idx, batch) in plan.batches().iter().enumerate() {
            if cancel.is_cancelled() {
                run.cancelled = true;
                for task_id in &batch.tasks {
                    run.record(task_id.clone(), TaskOutcome::Skipped);
                }
                continue;
            }

            debug!(batch = batch_idx, tasks = batch.tasks.len(), "starting batch");
            let mut handles: Vec<(String, JoinHandle<Invocation>)> = Vec::new();

            for task_id in &batch.tasks {
                let Some(task) = crew.task(task_id) else {
                    continue;
                };

                // Partial-failure isolation: a task whose dependency did not
                // succeed is skipped; independent siblings keep running.
                if let Some(dep) = task
                    .depends_on
                    .iter()
                    .find(|dep| run.output_of(dep).is_none())
                {
                    debug!(task = %task.id, dependency = %dep, "skipping task, dependency unavailable");
                    run.record(task.id.clone(), TaskOutcome::Skipped);
                    continue;
                }

                let mut ctx = context.clone();
                for dep in &task.depends_on {
                    if let Some(output) = run.output_of(dep) {
                        ctx.add_input(dep.clone(), output.to_string());
                    }
                }

                let worker = Arc::clone(&self.worker);
                let retry = self.config.retry.clone();
                let task_timeout = self.config.task_timeout;
                let cancel = cancel.clone();
                let task = task.clone();

                let handle = tokio::spawn(async move {
                    let task = Arc::new(task);
                    let ctx = Arc::new(ctx);

                    let attempt = {
                        let task = Arc::clone(&task);
                        move || {
                            let worker = Arc::clone(&worker);
                            let task = Arc::clone(&task);
                            let ctx = Arc::clone(&ctx);
                            async move {
                                match tokio::time::timeout(
                                    task_timeout,
                                    worker.invoke(&task, &ctx),
                                )
                                .await
                                {
                                    Ok(result) => result,
                                    // A timed-out attempt counts as a tool failure
                                    Err(_) => Err(Error::Timeout(task_timeout)),
                                }
                            }
                        }
                    };

                    let invoke = retry.execute(&task.id, attempt);
                    tokio::select! {
                        () = cancel.cancelled() => Invocation::Cancelled,
                        result = invoke => match result {
                            Ok(output) => Invocation::Completed(output),
                            Err(e) => Invocation::Failed(e.to_string()),
                        },
                    }
                });
                handles.push((task_id.clone(), handle));
            }

            // Batch barrier: every task reaches a terminal state before the
            // next batch starts, which also fences knowledge-store visibility.
            for (task_id, handle) in handles {
                let invocation = match handle.await {
                    Ok(invocation) => invocation,
                    Err(e) => Invocation::Failed(format!("task panicked: {e}")),
                };

                match invocation {
                    Invocation::Completed(output) => {
                        debug!(task = %task_id, "task succeeded");
                        self.record_knowledge(crew, &task_id, run.subject.as_str(), &output)
                            .await;
                        run.record(task_id, TaskOutcome::Succeeded(output));
                    }
                    Invocation::Failed(reason) => {
                        warn!(task = %task_id, %reason, "task failed");
                        run.record(task_id, TaskOutcome::Failed(reason));
                    }
                    Invocation::Cancelled => {
                        run.cancelled = true;
                        run.record(task_id, TaskOutcome::Skipped);
                    }
                }
            }
        }

        let report = run.finalize(crew);
        info!(
            crew = %report.crew,
            run_id = %report.run_id,
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            skipped = report.skipped().len(),
            cancelled = report.cancelled,
            "crew run finished"
        );
        Ok(report)
    }

    /// Store a succeeded task's output, tagged with its category
    ///
    /// A rejected entry is reported and dropped; the run continues.
    async fn record_knowledge(&self, crew: &Crew, task_id: &str, subject: &str, output: &str) {
        let Some(task) = crew.task(task_id) else {
            return;
        };

        let entry = KnowledgeEntry::builder(subject, task.category)
            .source(task.id.clone())
            .content(output)
            .build();

        if let Err(e) = self.store.put(entry).await {
            warn!(task = task_id, error = %e, "knowledge entry rejected");
        }
    }
}
