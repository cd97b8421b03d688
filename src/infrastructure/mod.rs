//! Infrastructure layer - external service integrations
//!
//! This layer contains:
//! - JSON-RPC client for a Substrate node (metadata fetch, submission)
//! - The external signing seam
//! - Tokio runtime bridge for async operations

pub mod chain;
pub mod runtime;
