//! Cross-crew flow composition
//!
//! A flow chains whole crews the way the scheduler chains tasks: research
//! crews run first (concurrently where their edges allow), and downstream
//! crews receive the final outputs of every crew they listen on. A typical
//! flow runs stock, ETF, and crypto research crews and feeds a report crew
//! that listens on all three.

use crate::cancel::CancelToken;
use crate::coordinator::{CrewCoordinator, CrewReport};
use crate::crew::Crew;
use chrono::{DateTime, Utc};
use crew_core::{Error, Result, TaskContext};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// One crew in a flow, with the crews it listens on
#[derive(Debug, Clone)]
struct FlowNode {
    crew: Crew,
    after: Vec<String>,
}

/// Outcome of one crew within a flow run
#[derive(Debug, Clone)]
pub enum CrewOutcome {
    /// The crew ran; the report may still record partial failures
    Ran(CrewReport),
    /// The crew never ran: an upstream crew produced no final output,
    /// or the flow was cancelled
    Skipped,
}

impl CrewOutcome {
    /// The crew's report, if it ran
    pub fn report(&self) -> Option<&CrewReport> {
        match self {
            Self::Ran(report) => Some(report),
            Self::Skipped => None,
        }
    }
}

/// Summary of a flow run
#[derive(Debug, Clone)]
pub struct FlowReport {
    /// When the flow started
    pub started_at: DateTime<Utc>,
    /// When the flow finished
    pub finished_at: DateTime<Utc>,
    /// Per-crew outcomes, in declaration order
    crews: Vec<(String, CrewOutcome)>,
}

impl FlowReport {
    /// Outcome of a specific crew
    pub fn outcome(&self, crew: &str) -> Option<&CrewOutcome> {
        self.crews
            .iter()
            .find(|(name, _)| name == crew)
            .map(|(_, outcome)| outcome)
    }

    /// Iterate over all crew outcomes in declaration order
    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &CrewOutcome)> {
        self.crews.iter().map(|(name, o)| (name.as_str(), o))
    }

    /// Whether every crew ran to a complete report
    pub fn is_complete(&self) -> bool {
        self.crews
            .iter()
            .all(|(_, o)| o.report().is_some_and(CrewReport::is_complete))
    }
}

/// A DAG of crews executed as one workflow
///
/// # Example
///
/// ```no_run
/// use crew_workflow::{Crew, CrewPolicy, Flow};
///
/// # fn example(stock: Crew, etf: Crew, report: Crew) -> crew_core::Result<()> {
/// let flow = Flow::builder()
///     .add_crew(stock)
///     .add_crew(etf)
///     .add_crew_after(report, ["stock_crew", "etf_crew"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct Flow {
    nodes: Vec<FlowNode>,
}

impl Flow {
    /// Create a new flow builder
    pub fn builder() -> FlowBuilder {
        FlowBuilder::new()
    }

    /// Execute all crews, respecting the listen-on edges
    pub async fn run(
        &self,
        coordinator: &CrewCoordinator,
        context: TaskContext,
    ) -> Result<FlowReport> {
        self.run_with_cancel(coordinator, context, CancelToken::new())
            .await
    }

    /// Execute with an external cancellation handle
    ///
    /// Cancellation propagates into the crews of the running layer and skips
    /// every later layer.
    pub async fn run_with_cancel(
        &self,
        coordinator: &CrewCoordinator,
        context: TaskContext,
        cancel: CancelToken,
    ) -> Result<FlowReport> {
        let started_at = Utc::now();
        info!(crews = self.nodes.len(), "starting flow run");

        // Final output per finished crew; None marks a crew whose terminal
        // task did not succeed.
        let mut outputs: HashMap<String, Option<String>> = HashMap::new();
        let mut results: HashMap<String, CrewOutcome> = HashMap::new();

        for layer in self.layers() {
            let mut running = Vec::new();

            for node in layer {
                if cancel.is_cancelled() {
                    results.insert(node.crew.name.clone(), CrewOutcome::Skipped);
                    continue;
                }

                // A crew with a silent upstream is skipped, not aborted over
                let missing = node
                    .after
                    .iter()
                    .find(|up| outputs.get(*up).map_or(true, Option::is_none));
                if let Some(up) = missing {
                    debug!(crew = %node.crew.name, upstream = %up, "skipping crew, upstream produced no output");
                    results.insert(node.crew.name.clone(), CrewOutcome::Skipped);
                    continue;
                }

                let mut ctx = context.clone();
                for up in &node.after {
                    if let Some(Some(output)) = outputs.get(up) {
                        ctx.add_input(up.clone(), output.clone());
                    }
                }

                let cancel = cancel.clone();
                running.push(async move {
                    let report = coordinator
                        .run_with_cancel(&node.crew, ctx, cancel)
                        .await;
                    (node.crew.name.clone(), report)
                });
            }

            // Layer barrier, mirroring the task-batch barrier one level up
            for (name, result) in join_all(running).await {
                let report = result?;
                outputs.insert(name.clone(), report.final_output.clone());
                results.insert(name, CrewOutcome::Ran(report));
            }
        }

        let crews: Vec<(String, CrewOutcome)> = self
            .nodes
            .iter()
            .map(|node| {
                let outcome = results
                    .remove(&node.crew.name)
                    .unwrap_or(CrewOutcome::Skipped);
                (node.crew.name.clone(), outcome)
            })
            .collect();

        let report = FlowReport {
            started_at,
            finished_at: Utc::now(),
            crews,
        };
        info!(
            complete = report.is_complete(),
            "flow run finished"
        );
        Ok(report)
    }

    /// Layer crews by their listen-on edges, stable by declaration order
    fn layers(&self) -> Vec<Vec<&FlowNode>> {
        let mut done: HashSet<&str> = HashSet::new();
        let mut layers = Vec::new();

        while done.len() < self.nodes.len() {
            let ready: Vec<&FlowNode> = self
                .nodes
                .iter()
                .filter(|n| !done.contains(n.crew.name.as_str()))
                .filter(|n| n.after.iter().all(|up| done.contains(up.as_str())))
                .collect();

            // The flow was validated acyclic at build time
            if ready.is_empty() {
                break;
            }

            done.extend(ready.iter().map(|n| n.crew.name.as_str()));
            layers.push(ready);
        }

        layers
    }
}

/// Builder for constructing flows
pub struct FlowBuilder {
    nodes: Vec<FlowNode>,
}

impl FlowBuilder {
    /// Create a new flow builder
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a crew with no upstream edges
    pub fn add_crew(mut self, crew: Crew) -> Self {
        self.nodes.push(FlowNode {
            crew,
            after: Vec::new(),
        });
        self
    }

    /// Add a crew that listens on the named crews
    ///
    /// The crew runs only after every named crew has produced a final
    /// output, which it receives as context inputs keyed by crew name.
    pub fn add_crew_after<I, S>(mut self, crew: Crew, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.push(FlowNode {
            crew,
            after: after.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build and validate the flow
    ///
    /// # Errors
    ///
    /// `Error::Config` for duplicate crew names, edges referencing unknown
    /// crews, or a cycle among crews.
    pub fn build(self) -> Result<Flow> {
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.crew.name.as_str()) {
                return Err(Error::Config(format!(
                    "flow declares crew '{}' more than once",
                    node.crew.name
                )));
            }
        }

        for node in &self.nodes {
            for up in &node.after {
                if !names.contains(up.as_str()) {
                    return Err(Error::Config(format!(
                        "crew '{}' listens on unknown crew '{}'",
                        node.crew.name, up
                    )));
                }
            }
        }

        let flow = Flow { nodes: self.nodes };

        // Layering consumes every node only when the graph is acyclic
        let layered: usize = flow.layers().iter().map(Vec::len).sum();
        if layered != flow.nodes.len() {
            return Err(Error::Config(
                "flow has a cycle among its crews".to_string(),
            ));
        }

        Ok(flow)
    }
}

impl Default for FlowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorConfig;
    use crate::crew::CrewPolicy;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use crew_core::{Category, Result, TaskDescriptor, Worker};
    use crew_knowledge::KnowledgeStore;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Echoes inputs so tests can observe cross-crew data flow
    #[derive(Default)]
    struct EchoWorker {
        failing_tasks: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Worker for EchoWorker {
        async fn invoke(&self, task: &TaskDescriptor, ctx: &TaskContext) -> Result<String> {
            self.calls.lock().unwrap().push(task.id.clone());
            if self.failing_tasks.contains(&task.id) {
                return Err(Error::Tool("scripted failure".to_string()));
            }
            let inputs = ctx.joined_inputs();
            if inputs.is_empty() {
                Ok(format!("{} findings", task.id))
            } else {
                Ok(format!("{} findings from [{inputs}]", task.id))
            }
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn research_crew(name: &str) -> Crew {
        Crew::builder(name, CrewPolicy::Sequential)
            .add_task(
                TaskDescriptor::builder(format!("{name}_research"), "analyst")
                    .category(Category::MarketData)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn report_crew() -> Crew {
        Crew::builder("report_crew", CrewPolicy::Sequential)
            .add_task(
                TaskDescriptor::builder("consolidate", "report_writer")
                    .category(Category::Report)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn coordinator(worker: Arc<EchoWorker>) -> CrewCoordinator {
        CrewCoordinator::with_config(
            worker,
            KnowledgeStore::default(),
            CoordinatorConfig {
                retry: RetryPolicy::no_retry(),
                task_timeout: Duration::from_secs(5),
            },
        )
    }

    fn three_plus_report() -> Flow {
        Flow::builder()
            .add_crew(research_crew("stock_crew"))
            .add_crew(research_crew("etf_crew"))
            .add_crew(research_crew("crypto_crew"))
            .add_crew_after(report_crew(), ["stock_crew", "etf_crew", "crypto_crew"])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_report_crew_receives_all_research_outputs() {
        let worker = Arc::new(EchoWorker::default());
        let calls = Arc::clone(&worker);
        let coordinator = coordinator(worker);

        let report = three_plus_report()
            .run(&coordinator, TaskContext::new("global markets"))
            .await
            .unwrap();

        assert!(report.is_complete());

        let consolidated = report
            .outcome("report_crew")
            .and_then(CrewOutcome::report)
            .and_then(|r| r.final_output.as_deref())
            .unwrap();
        assert!(consolidated.contains("stock_crew"));
        assert!(consolidated.contains("etf_crew"));
        assert!(consolidated.contains("crypto_crew"));

        // The report task ran last
        let calls = calls.calls.lock().unwrap();
        assert_eq!(calls.last().map(String::as_str), Some("consolidate"));
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_upstream_skips_dependent_crew() {
        let worker = Arc::new(EchoWorker {
            failing_tasks: vec!["etf_crew_research".to_string()],
            ..EchoWorker::default()
        });
        let calls = Arc::clone(&worker);
        let coordinator = coordinator(worker);

        let report = three_plus_report()
            .run(&coordinator, TaskContext::new("global markets"))
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert!(matches!(
            report.outcome("report_crew"),
            Some(CrewOutcome::Skipped)
        ));
        // Independent research crews still ran
        assert!(
            report
                .outcome("stock_crew")
                .and_then(CrewOutcome::report)
                .is_some_and(CrewReport::is_complete)
        );
        assert!(
            !calls
                .calls
                .lock()
                .unwrap()
                .contains(&"consolidate".to_string())
        );
    }

    #[tokio::test]
    async fn test_independent_crews_share_a_layer() {
        let flow = three_plus_report();
        let layers = flow.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].len(), 3);
        assert_eq!(layers[1][0].crew.name, "report_crew");
    }

    #[test]
    fn test_builder_rejects_unknown_upstream() {
        let result = Flow::builder()
            .add_crew_after(report_crew(), ["ghost_crew"])
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_duplicate_names() {
        let result = Flow::builder()
            .add_crew(research_crew("stock_crew"))
            .add_crew(research_crew("stock_crew"))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_cycle() {
        let result = Flow::builder()
            .add_crew_after(research_crew("a"), ["b"])
            .add_crew_after(research_crew("b"), ["a"])
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_cancelled_flow_skips_later_layers() {
        let worker = Arc::new(EchoWorker::default());
        let coordinator = coordinator(worker);

        let cancel = CancelToken::new();
        cancel.cancel();

        let report = three_plus_report()
            .run_with_cancel(&coordinator, TaskContext::new("global markets"), cancel)
            .await
            .unwrap();

        for (_, outcome) in report.outcomes() {
            assert!(matches!(outcome, CrewOutcome::Skipped));
        }
    }
}
