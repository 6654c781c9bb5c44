//! modkit End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the flows that span modules:
//!
//! - Loading: raw configuration -> validated extension instance
//! - Constraints: webhook subscription rules through the loader
//! - Rewriting: schema order, pruning and idempotency (property tests)
//! - Transforms: validate and deploy hooks against real directories
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p modkit-tests
//!
//! # With library logging
//! RUST_LOG=modkit_spec=debug cargo test -p modkit-tests -- --nocapture
//! ```

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use harness::{init_tracing, load, ExtensionDir};
