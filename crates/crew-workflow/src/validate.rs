//! Configuration-time validation of a crew's descriptor graph
//!
//! Every check here runs before a single worker is invoked: a doomed run
//! must fail before it spends money on tool or LLM calls.

use crate::crew::{Crew, CrewPolicy};
use crew_core::{Error, Result};
use std::collections::{HashMap, HashSet, VecDeque};

/// Validate a crew's task descriptors
///
/// Checks, in order:
/// 1. task ids are unique within the crew,
/// 2. every `depends_on` reference resolves within the crew,
/// 3. the dependency graph is acyclic,
/// 4. for a sequential crew, the last declared task is synchronous
///    (`allow_concurrent = false`).
pub fn validate(crew: &Crew) -> Result<()> {
    let mut seen = HashSet::new();
    for task in &crew.tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(Error::Config(format!(
                "crew '{}' declares task '{}' more than once",
                crew.name, task.id
            )));
        }
    }

    for task in &crew.tasks {
        for dep in &task.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(Error::UnresolvedDependency {
                    task: task.id.clone(),
                    missing: dep.clone(),
                });
            }
        }
    }

    check_acyclic(crew)?;

    if crew.policy == CrewPolicy::Sequential {
        if let Some(last) = crew.tasks.last() {
            if last.allow_concurrent {
                return Err(Error::Config(format!(
                    "sequential crew '{}' must end with a synchronous task, \
                     but '{}' has allow_concurrent = true",
                    crew.name, last.id
                )));
            }
        }
    }

    Ok(())
}

/// Cycle detection using Kahn's algorithm
///
/// If the peel-off does not consume every task, whatever remains lies on a
/// cycle; the error names those tasks.
fn check_acyclic(crew: &Crew) -> Result<()> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for task in &crew.tasks {
        in_degree.insert(&task.id, task.depends_on.len());
        for dep in &task.depends_on {
            dependents.entry(dep).or_default().push(&task.id);
        }
    }

    let mut queue: VecDeque<&str> = crew
        .tasks
        .iter()
        .filter(|t| t.depends_on.is_empty())
        .map(|t| t.id.as_str())
        .collect();

    let mut resolved = 0;
    while let Some(id) = queue.pop_front() {
        resolved += 1;
        if let Some(deps) = dependents.get(id) {
            for dependent in deps {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if resolved != crew.tasks.len() {
        let mut cyclic: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(id, _)| *id)
            .collect();
        cyclic.sort_unstable();
        return Err(Error::Config(format!(
            "crew '{}' has a dependency cycle among tasks: {}",
            crew.name,
            cyclic.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::{Category, TaskDescriptor};

    fn task(id: &str, deps: &[&str], allow_concurrent: bool) -> TaskDescriptor {
        let mut builder = TaskDescriptor::builder(id, "analyst")
            .category(Category::MarketData)
            .allow_concurrent(allow_concurrent);
        for dep in deps {
            builder = builder.depends_on(*dep);
        }
        builder.build().unwrap()
    }

    fn crew(policy: CrewPolicy, tasks: Vec<TaskDescriptor>) -> Crew {
        // Bypasses CrewBuilder so tests exercise validate directly
        Crew {
            name: "test_crew".to_string(),
            policy,
            tasks,
        }
    }

    #[test]
    fn test_valid_dag_passes() {
        let crew = crew(
            CrewPolicy::Parallel,
            vec![
                task("a", &[], true),
                task("b", &["a"], true),
                task("c", &["a", "b"], false),
            ],
        );
        assert!(validate(&crew).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let crew = crew(
            CrewPolicy::Parallel,
            vec![task("a", &[], true), task("a", &[], true)],
        );
        assert!(matches!(validate(&crew), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let crew = crew(CrewPolicy::Parallel, vec![task("a", &["ghost"], true)]);
        match validate(&crew) {
            Err(Error::UnresolvedDependency { task, missing }) => {
                assert_eq!(task, "a");
                assert_eq!(missing, "ghost");
            }
            other => panic!("expected UnresolvedDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_rejected() {
        let crew = crew(
            CrewPolicy::Parallel,
            vec![
                task("a", &["c"], true),
                task("b", &["a"], true),
                task("c", &["b"], false),
            ],
        );
        match validate(&crew) {
            Err(Error::Config(msg)) => {
                assert!(msg.contains("cycle"));
                assert!(msg.contains('a') && msg.contains('b') && msg.contains('c'));
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_rejected() {
        let crew = crew(CrewPolicy::Parallel, vec![task("a", &["a"], false)]);
        assert!(matches!(validate(&crew), Err(Error::Config(_))));
    }

    #[test]
    fn test_sequential_concurrent_terminal_rejected() {
        let tasks = vec![
            task("screen", &[], true),
            task("detail", &["screen"], true),
            task("synthesis", &["detail"], true),
        ];
        let bad = crew(CrewPolicy::Sequential, tasks.clone());
        assert!(matches!(validate(&bad), Err(Error::Config(_))));

        // Same chain with a synchronous terminal task validates
        let mut tasks = tasks;
        tasks.pop();
        tasks.push(task("synthesis", &["detail"], false));
        let good = crew(CrewPolicy::Sequential, tasks);
        assert!(validate(&good).is_ok());
    }

    #[test]
    fn test_parallel_crew_ignores_terminal_flag() {
        let crew = crew(
            CrewPolicy::Parallel,
            vec![task("a", &[], true), task("b", &["a"], true)],
        );
        assert!(validate(&crew).is_ok());
    }
}
