//! Stock research crew example
//!
//! Wires a five-task sequential research crew (market analysis through
//! report synthesis) to a stub worker and runs it end to end, printing the
//! per-task outcomes and the knowledge entries the run produced.
//!
//! To run this example:
//! ```bash
//! cargo run --example stock_research AAPL
//! ```

use async_trait::async_trait;
use crew_core::{Category, Result, TaskContext, TaskDescriptor, Worker};
use crew_knowledge::{KnowledgeStore, QueryFilter};
use crew_workflow::{Crew, CrewCoordinator, CrewPolicy};
use std::env;
use std::sync::Arc;

/// Stand-in for the real tool/LLM layer
///
/// Produces canned prose per agent so the pipeline can be exercised without
/// network access or API keys.
struct StubWorker;

#[async_trait]
impl Worker for StubWorker {
    async fn invoke(&self, task: &TaskDescriptor, ctx: &TaskContext) -> Result<String> {
        let subject = ctx.subject();
        let text = match task.agent.name.as_str() {
            "market_analyst" => {
                format!("{subject}: sector momentum positive, three candidates flagged.")
            }
            "technical_analyst" => {
                format!("{subject}: valuation stretched but earnings revisions trending up.")
            }
            "risk_assessor" => {
                format!("{subject}: concentration and rate-sensitivity are the main risks.")
            }
            "investment_strategist" => {
                format!("{subject}: staged entry over two quarters, 4% portfolio cap.")
            }
            _ => format!(
                "Investment thesis for {subject}, synthesized from:\n{}",
                ctx.joined_inputs()
            ),
        };
        Ok(text)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn stock_crew() -> crew_core::Result<Crew> {
    Crew::builder("stock_crew", CrewPolicy::Sequential)
        .add_task(
            TaskDescriptor::builder("market_analysis", "market_analyst")
                .category(Category::MarketData)
                .build()?,
        )
        .add_task(
            TaskDescriptor::builder("technical_evaluation", "technical_analyst")
                .depends_on("market_analysis")
                .category(Category::Fundamental)
                .build()?,
        )
        .add_task(
            TaskDescriptor::builder("risk_assessment", "risk_assessor")
                .depends_on("technical_evaluation")
                .category(Category::Risk)
                .build()?,
        )
        .add_task(
            TaskDescriptor::builder("investment_strategy", "investment_strategist")
                .depends_on("risk_assessment")
                .category(Category::Strategy)
                .build()?,
        )
        .add_task(
            TaskDescriptor::builder("research_synthesis", "research_director")
                .depends_on("market_analysis")
                .depends_on("technical_evaluation")
                .depends_on("risk_assessment")
                .depends_on("investment_strategy")
                .category(Category::Report)
                .output_target("stock_investment_thesis.html")
                .build()?,
        )
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crew_utils::init_tracing();

    // Get the research subject from command line arguments
    let args: Vec<String> = env::args().collect();
    let subject = if args.len() > 1 { &args[1] } else { "AAPL" };

    println!("=== Stock Research Crew ===\n");
    println!("Researching: {subject}\n");

    let crew = stock_crew()?;
    let store = KnowledgeStore::default();
    let coordinator = CrewCoordinator::new(Arc::new(StubWorker), store.clone());

    let report = coordinator.run(&crew, TaskContext::new(subject)).await?;

    println!("Run {} finished (complete: {})\n", report.run_id, report.is_complete());
    for (task_id, outcome) in report.outcomes() {
        match outcome.output() {
            Some(output) => println!("[ok]   {task_id}: {output}\n"),
            None => println!("[--]   {task_id}: {outcome:?}\n"),
        }
    }

    if let Some(thesis) = &report.final_output {
        println!("=== Final Thesis ===\n{thesis}\n");
    }

    let entries = store.query(QueryFilter::new().asset(subject)).await;
    println!("Knowledge store now holds {} entries for {subject}:", entries.len());
    for entry in entries {
        println!("  - [{}] from {} at {}", entry.category, entry.source, entry.timestamp);
    }

    Ok(())
}
