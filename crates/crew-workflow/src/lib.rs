//! Crew orchestration for crew-rs
//!
//! This crate turns a validated set of task descriptors into ordered
//! execution batches and runs them: validation rejects bad graphs before any
//! worker is invoked, the scheduler layers the dependency DAG into batches,
//! and the coordinator executes batches with retry, timeout, cancellation,
//! and partial-failure isolation, feeding every output through the shared
//! knowledge store. Flows compose whole crews into a higher-level DAG.

pub mod cancel;
pub mod coordinator;
pub mod crew;
pub mod flow;
pub mod retry;
pub mod scheduler;
pub mod validate;

pub use cancel::CancelToken;
pub use coordinator::{CoordinatorConfig, CrewCoordinator, CrewReport, TaskOutcome};
pub use crew::{Crew, CrewBuilder, CrewPolicy};
pub use flow::{CrewOutcome, Flow, FlowBuilder, FlowReport};
pub use retry::RetryPolicy;
pub use scheduler::{ExecutionBatch, ExecutionPlan, Scheduler};
