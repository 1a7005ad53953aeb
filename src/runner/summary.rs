//! Run statistics

use std::time::Duration;

/// Counters collected over one run of the batch runner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows in the table
    pub total_rows: usize,

    /// Row the run started from
    pub resume_from: usize,

    /// Tasks scheduled for this run
    pub tasks: usize,

    /// Rows at or after the resume offset without a url
    pub skipped_rows: usize,

    /// Tasks that ended with a manifest URL
    pub succeeded: usize,

    /// Tasks that exhausted their retries
    pub failed: usize,

    /// Extraction attempts across all tasks
    pub attempts: u64,

    /// Successful table flushes, including the final one
    pub flushes: usize,

    pub flush_failures: usize,

    pub checkpoint_failures: usize,

    /// True once the final flush succeeded and the checkpoint was cleared
    pub completed: bool,

    pub elapsed: Duration,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Share of processed tasks that found a manifest, in percent
    pub fn success_rate(&self) -> f64 {
        if self.processed() == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.processed() as f64 * 100.0
        }
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Sweep Summary ===\n");

    println!("Table:");
    println!("  Rows: {}", summary.total_rows);
    println!("  Started at row: {}", summary.resume_from);
    println!("  Rows without URL: {}", summary.skipped_rows);
    println!();

    println!("Tasks:");
    println!("  Scheduled: {}", summary.tasks);
    println!("  Manifest found: {}", summary.succeeded);
    println!("  Gave up: {}", summary.failed);
    println!("  Extraction attempts: {}", summary.attempts);
    println!();

    println!("Persistence:");
    println!("  Flushes: {}", summary.flushes);
    if summary.flush_failures > 0 {
        println!("  Flush failures: {}", summary.flush_failures);
    }
    if summary.checkpoint_failures > 0 {
        println!("  Checkpoint write failures: {}", summary.checkpoint_failures);
    }
    println!(
        "  Status: {}",
        if summary.completed {
            "complete"
        } else {
            "incomplete (checkpoint kept)"
        }
    );
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} tasks) in {:.1}s",
        summary.success_rate(),
        summary.succeeded,
        summary.processed(),
        summary.elapsed.as_secs_f64()
    );
}
