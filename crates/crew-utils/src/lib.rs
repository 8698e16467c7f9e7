//! Shared utilities for crew-rs
//!
//! This crate provides common functionality used across the crew-rs workspace,
//! including logging setup and text scoring helpers.

pub mod logging;
pub mod text;

pub use logging::{init_tracing, init_tracing_with};
pub use text::{overlap_score, tokenize};
