//! Batch runner module
//!
//! This module contains the sweep engine, including:
//! - Sub-batch dispatch over a bounded worker pool
//! - Per-task retry with a constant delay
//! - Per-task checkpointing and periodic table flushes
//! - Run statistics

mod coordinator;
mod progress;
mod retry;
mod summary;

pub use coordinator::{run_sweep, BatchRunner, SweepPlan};
pub use progress::SubBatchProgress;
pub use retry::{extract_with_retry, RetryPolicy, TaskOutcome};
pub use summary::{print_summary, RunSummary};
