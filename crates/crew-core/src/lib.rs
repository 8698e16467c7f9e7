//! Core abstractions for crew-rs
//!
//! This crate defines the fundamental traits and types used throughout the
//! crew-rs workspace: the task descriptor model, the `Worker` seam to the
//! external tool/LLM layer, the per-task execution context, and the shared
//! error taxonomy.

pub mod category;
pub mod context;
pub mod error;
pub mod task;
pub mod worker;

pub use category::Category;
pub use context::TaskContext;
pub use error::{Error, Result};
pub use task::{AgentRef, TaskDescriptor, TaskDescriptorBuilder};
pub use worker::Worker;
