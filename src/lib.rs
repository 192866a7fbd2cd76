//! Recruiting pipeline tracker.
//!
//! Candidates move through the ordered rounds of a job opening. This crate
//! owns the round-progression state machine: round templates and their
//! lifecycle, staged per-candidate status edits with partial-success batch
//! commits, and carrying a round's whole candidate population forward.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;

pub use error::PipelineError;
