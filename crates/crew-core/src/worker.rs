//! The Worker seam to the external tool/LLM layer

use crate::{Result, TaskContext, TaskDescriptor};
use async_trait::async_trait;

/// Fulfills task invocations on behalf of the coordinator
///
/// The core does not know how a call is fulfilled - a search API, a web
/// scraper, a finance data feed, an LLM, or any combination. Implementations
/// route on the descriptor's agent reference and may read the shared
/// knowledge store through their own handle.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Execute one task and return its textual output
    ///
    /// # Arguments
    ///
    /// * `task` - The descriptor being executed
    /// * `context` - Subject, upstream outputs, and run inputs
    ///
    /// # Errors
    ///
    /// `Error::Tool` for invocation failures. Transient failures are retried
    /// by the coordinator according to its retry policy.
    async fn invoke(&self, task: &TaskDescriptor, context: &TaskContext) -> Result<String>;

    /// Get the worker's name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    struct EchoWorker;

    #[async_trait]
    impl Worker for EchoWorker {
        async fn invoke(&self, task: &TaskDescriptor, context: &TaskContext) -> Result<String> {
            Ok(format!("{} on {}", task.agent, context.subject()))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_worker_invoke() {
        let worker = EchoWorker;
        let task = TaskDescriptor::builder("screening", "market_analyst")
            .category(Category::MarketData)
            .build()
            .unwrap();
        let ctx = TaskContext::new("AAPL");

        let output = worker.invoke(&task, &ctx).await.unwrap();
        assert_eq!(output, "market_analyst on AAPL");
        assert_eq!(worker.name(), "echo");
    }
}
