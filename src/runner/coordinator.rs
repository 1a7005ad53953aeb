//! Batch runner - main sweep orchestration logic
//!
//! This module contains the loop that ties everything together:
//! - Loading the table and resolving where to resume
//! - Dispatching sub-batches over a bounded worker pool
//! - Writing results, checkpoints and periodic flushes as tasks finish
//! - Final flush and checkpoint cleanup

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::extractor::{HttpManifestExtractor, ManifestExtractor};
use crate::runner::progress::SubBatchProgress;
use crate::runner::retry::{extract_with_retry, RetryPolicy, TaskOutcome};
use crate::runner::summary::RunSummary;
use crate::table::{load_table, write_table, RowSet, Task, TaskPlan};
use crate::SweepError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Table loaded and split into pending work, before anything runs
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub rows: RowSet,
    pub resume_from: usize,
    pub plan: TaskPlan,
}

/// Bookkeeping for periodic flushes
struct FlushClock {
    processed: usize,
    last_flush: Instant,
}

/// Drives a sweep over one table
pub struct BatchRunner {
    config: Config,
    extractor: Arc<dyn ManifestExtractor>,
    checkpoint: CheckpointStore,
}

impl BatchRunner {
    /// Creates a runner for the table named in `config`
    pub fn new(config: Config, extractor: Arc<dyn ManifestExtractor>) -> Self {
        let checkpoint = CheckpointStore::for_table(&config.table);
        Self {
            config,
            extractor,
            checkpoint,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    /// Row to start from: explicit setting, else checkpoint, else 0
    ///
    /// An unreadable checkpoint is logged and treated as absent.
    pub fn resolve_resume_offset(&self) -> usize {
        if let Some(start) = self.config.runner.resume_from {
            tracing::info!("Starting at explicitly requested row {}", start);
            return start;
        }

        match self.checkpoint.read() {
            Ok(Some(start)) => {
                tracing::info!("Resuming from checkpoint at row {}", start);
                start
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(
                    "Failed to read checkpoint {}: {}; starting from row 0",
                    self.checkpoint.path().display(),
                    e
                );
                0
            }
        }
    }

    /// Loads the table and works out the pending tasks without running them
    pub fn plan(&self) -> Result<SweepPlan, SweepError> {
        let path = &self.config.table.path;
        tracing::info!("Loading table {}", path.display());

        let rows = load_table(path, &self.config.table)?;
        tracing::info!(
            "Loaded {} rows with columns {:?}",
            rows.len(),
            rows.schema().columns()
        );

        let resume_from = self.resolve_resume_offset();
        let plan = rows.plan_tasks(resume_from);

        Ok(SweepPlan {
            rows,
            resume_from,
            plan,
        })
    }

    /// Runs the sweep to completion
    ///
    /// Only a table that cannot be loaded makes this return an error. Failed
    /// extractions, flushes and checkpoint writes are logged and counted in
    /// the returned [`RunSummary`].
    pub async fn run(&self) -> Result<RunSummary, SweepError> {
        let start_time = Instant::now();
        let runner = &self.config.runner;

        let SweepPlan {
            mut rows,
            resume_from,
            plan,
        } = self.plan()?;

        let mut summary = RunSummary {
            total_rows: rows.len(),
            resume_from,
            tasks: plan.tasks.len(),
            skipped_rows: plan.skipped.len(),
            ..RunSummary::default()
        };

        if plan.tasks.is_empty() {
            tracing::info!("Nothing to process, all rows are done");
            if let Err(e) = self.checkpoint.clear() {
                tracing::error!("Failed to remove checkpoint: {}", e);
            }
            summary.completed = true;
            summary.elapsed = start_time.elapsed();
            return Ok(summary);
        }

        tracing::info!(
            "Pending tasks: {} (workers={}, flush every {} rows or {}s, batch size {})",
            plan.tasks.len(),
            runner.workers,
            runner.flush_every,
            runner.flush_interval_secs,
            runner.batch_size
        );

        let mut clock = FlushClock {
            processed: 0,
            last_flush: Instant::now(),
        };
        let total_tasks = plan.tasks.len();
        let batch_size = runner.batch_size.max(1);
        let batches: Vec<&[Task]> = plan.tasks.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (batch_no, batch) in batches.into_iter().enumerate() {
            let batch_start = batch_no * batch_size;
            let batch_end = batch_start + batch.len();
            tracing::info!(
                "Starting tasks {} to {} (of {})",
                batch_start + 1,
                batch_end,
                total_tasks
            );

            self.run_sub_batch(batch, &mut rows, &mut clock, &mut summary)
                .await;

            self.extractor.reset_session_cache();

            tracing::info!(
                "Completed {}/{} tasks ({:.1}%)",
                batch_end,
                total_tasks,
                batch_end as f64 / total_tasks as f64 * 100.0
            );

            if batch_no + 1 < batch_count && !runner.batch_pause().is_zero() {
                tracing::debug!("Pausing {:?} before next batch", runner.batch_pause());
                tokio::time::sleep(runner.batch_pause()).await;
            }
        }

        if self.flush(&rows, &mut summary) {
            tracing::info!("All rows processed, final results saved");
            match self.checkpoint.clear() {
                Ok(()) => summary.completed = true,
                Err(e) => tracing::error!("Failed to remove checkpoint: {}", e),
            }
        } else {
            tracing::error!("Final save failed, checkpoint kept for the next run");
        }

        summary.elapsed = start_time.elapsed();
        Ok(summary)
    }

    /// Runs one sub-batch on a pool of `workers` and applies results as they arrive
    ///
    /// Returns once every task of the sub-batch has produced an outcome.
    async fn run_sub_batch(
        &self,
        batch: &[Task],
        rows: &mut RowSet,
        clock: &mut FlushClock,
        summary: &mut RunSummary,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.runner.workers.max(1)));
        let policy = RetryPolicy::new(
            self.config.runner.max_retries,
            self.config.runner.retry_delay(),
        );
        let total_rows = rows.len();
        let mut progress = SubBatchProgress::new(batch);
        let mut workers: JoinSet<TaskOutcome> = JoinSet::new();

        for task in batch.iter().cloned() {
            let semaphore = Arc::clone(&semaphore);
            let extractor = Arc::clone(&self.extractor);

            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                tracing::info!(
                    "Processing row {}/{}: {}",
                    task.index + 1,
                    total_rows,
                    task.display_name
                );
                tracing::info!("URL: {}", task.url);
                extract_with_retry(&extractor, &task, &policy).await
            });
        }

        self.collect_outcomes(workers, rows, &mut progress, clock, summary)
            .await;
    }

    /// Applies outcomes in completion order until the pool is drained
    ///
    /// A worker that ends without an outcome leaves its row pending; once the
    /// pool is empty such rows are recorded as empty results.
    async fn collect_outcomes(
        &self,
        mut workers: JoinSet<TaskOutcome>,
        rows: &mut RowSet,
        progress: &mut SubBatchProgress,
        clock: &mut FlushClock,
        summary: &mut RunSummary,
    ) {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => self.apply_outcome(outcome, rows, progress, clock, summary),
                Err(e) => tracing::error!("Worker ended without a result: {}", e),
            }
        }

        for index in progress.pending() {
            tracing::warn!("Row {}: worker lost, recording empty result", index + 1);
            let lost = TaskOutcome {
                index,
                attempts: 0,
                manifest: None,
            };
            self.apply_outcome(lost, rows, progress, clock, summary);
        }
    }

    /// Records one finished task: row value, checkpoint, counters, maybe a flush
    fn apply_outcome(
        &self,
        outcome: TaskOutcome,
        rows: &mut RowSet,
        progress: &mut SubBatchProgress,
        clock: &mut FlushClock,
        summary: &mut RunSummary,
    ) {
        summary.attempts += u64::from(outcome.attempts);
        match &outcome.manifest {
            Some(manifest) => {
                tracing::info!("Row {}: found manifest {}", outcome.index + 1, manifest);
                summary.succeeded += 1;
            }
            None => {
                tracing::warn!("Row {}: no manifest", outcome.index + 1);
                summary.failed += 1;
            }
        }

        rows.set_manifest(outcome.index, outcome.value());

        let next_index = progress.complete(outcome.index);
        if let Err(e) = self.checkpoint.write(next_index) {
            tracing::error!("Failed to write checkpoint {}: {}", next_index, e);
            summary.checkpoint_failures += 1;
        }

        clock.processed += 1;
        let interval_elapsed = clock.last_flush.elapsed() > self.config.runner.flush_interval();
        let due = clock.processed % self.config.runner.flush_every.max(1) == 0 || interval_elapsed;
        if due && self.flush(rows, summary) {
            tracing::info!(
                "Processed {}/{} tasks, results saved",
                clock.processed,
                summary.tasks
            );
            clock.last_flush = Instant::now();
        }
    }

    /// Writes the full table, returning whether it succeeded
    fn flush(&self, rows: &RowSet, summary: &mut RunSummary) -> bool {
        match write_table(&self.config.table.path, rows) {
            Ok(()) => {
                summary.flushes += 1;
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to save {}: {}",
                    self.config.table.path.display(),
                    e
                );
                summary.flush_failures += 1;
                false
            }
        }
    }
}

/// Runs a sweep with the built-in HTTP extractor
///
/// # Example
///
/// ```no_run
/// use m3u8_sweep::config::Config;
/// use m3u8_sweep::runner::run_sweep;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_sweep(Config::default()).await?;
/// println!("{} manifests found", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(config: Config) -> Result<RunSummary, SweepError> {
    let extractor = HttpManifestExtractor::new(&config.extractor)?;
    BatchRunner::new(config, Arc::new(extractor)).run().await
}
