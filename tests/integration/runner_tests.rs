//! Integration tests for the batch runner
//!
//! These tests drive full sweeps over temporary CSV tables with a scripted
//! extractor that records every call.

use async_trait::async_trait;
use m3u8_sweep::checkpoint::CheckpointStore;
use m3u8_sweep::config::Config;
use m3u8_sweep::table::load_table;
use m3u8_sweep::{BatchRunner, ExtractError, ManifestExtractor};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Extractor whose behaviour is fixed per URL
#[derive(Default)]
struct Scripted {
    /// URLs that fail on every attempt
    failing: HashSet<String>,
    /// Per-URL artificial latency
    slow: Vec<(String, Duration)>,
    /// Checkpoint to sample at the start of each call
    checkpoint: Option<PathBuf>,
    /// Directory to delete on the first call
    remove_on_first_call: Option<PathBuf>,

    calls: Mutex<Vec<String>>,
    samples: Mutex<Vec<(usize, Option<usize>)>>,
    resets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Scripted {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl ManifestExtractor for Scripted {
    async fn extract_manifest_url(&self, url: &str) -> Result<Option<String>, ExtractError> {
        let first_call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.len() == 1
        };

        if first_call {
            if let Some(dir) = &self.remove_on_first_call {
                std::fs::remove_dir_all(dir).unwrap();
            }
        }

        if let Some(path) = &self.checkpoint {
            let value = std::fs::read_to_string(path)
                .ok()
                .and_then(|s| s.trim().parse().ok());
            self.samples
                .lock()
                .unwrap()
                .push((row_index(url), value));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .slow
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, d)| *d)
            .unwrap_or(Duration::from_millis(2));
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(url) {
            Err(ExtractError::Other(format!("no player on {}", url)))
        } else {
            Ok(Some(manifest_for(url)))
        }
    }

    fn reset_session_cache(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn video_url(index: usize) -> String {
    format!("https://example.com/video/{}", index)
}

fn manifest_for(url: &str) -> String {
    format!("{}/master.m3u8", url)
}

fn row_index(url: &str) -> usize {
    url.rsplit('/').next().unwrap().parse().unwrap()
}

/// Writes a `title,url` table with `rows` rows; indices in `blank` get no url
fn write_videos(dir: &Path, rows: usize, blank: &[usize]) -> PathBuf {
    let path = dir.join("videos.csv");
    let mut content = String::from("title,url\n");
    for i in 0..rows {
        let url = if blank.contains(&i) {
            String::new()
        } else {
            video_url(i)
        };
        content.push_str(&format!("video {},{}\n", i, url));
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn test_config(path: &Path, workers: usize, flush_every: usize) -> Config {
    let mut config = Config::default();
    config.table.path = path.to_path_buf();
    config.runner.workers = workers;
    config.runner.flush_every = flush_every;
    config.runner.batch_size = 10;
    config.runner.max_retries = 3;
    config.runner.retry_delay_ms = 1;
    config.runner.batch_pause_ms = 1;
    config
}

fn manifests(path: &Path) -> Vec<String> {
    let rows = load_table(path, &Config::default().table).unwrap();
    (0..rows.len()).map(|i| rows.manifest(i).to_string()).collect()
}

#[tokio::test]
async fn test_twelve_rows_two_sub_batches() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 12, &[]);
    let extractor = Arc::new(Scripted::default());

    let runner = BatchRunner::new(test_config(&path, 2, 5), extractor.clone());
    let summary = runner.run().await.unwrap();

    assert_eq!(summary.total_rows, 12);
    assert_eq!(summary.tasks, 12);
    assert_eq!(summary.succeeded, 12);
    assert_eq!(summary.failed, 0);
    // after the 5th and 10th completions, plus the final save
    assert_eq!(summary.flushes, 3);
    assert!(summary.completed);

    assert_eq!(extractor.resets.load(Ordering::SeqCst), 2);
    assert!(extractor.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert!(!runner.checkpoint().exists());

    let expected: Vec<String> = (0..12).map(|i| manifest_for(&video_url(i))).collect();
    assert_eq!(manifests(&path), expected);
}

#[tokio::test]
async fn test_blank_url_row_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 12, &[3]);
    let extractor = Arc::new(Scripted::default());

    let runner = BatchRunner::new(test_config(&path, 2, 5), extractor.clone());
    let summary = runner.run().await.unwrap();

    assert_eq!(summary.tasks, 11);
    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(extractor.calls().len(), 11);

    let written = manifests(&path);
    assert_eq!(written.len(), 12);
    assert_eq!(written[3], "");
    assert_eq!(written[4], manifest_for(&video_url(4)));
    assert!(!runner.checkpoint().exists());
}

#[tokio::test]
async fn test_failing_row_gets_exactly_max_attempts() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 4, &[]);
    let extractor = Arc::new(Scripted {
        failing: HashSet::from([video_url(1)]),
        ..Scripted::default()
    });

    let mut config = test_config(&path, 2, 5);
    config.runner.max_retries = 4;
    let summary = BatchRunner::new(config, extractor.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(extractor.calls_for(&video_url(1)), 4);
    assert_eq!(extractor.calls_for(&video_url(0)), 1);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.attempts, 7);
    assert!(summary.completed);

    let written = manifests(&path);
    assert_eq!(written[1], "");
    assert_eq!(written[2], manifest_for(&video_url(2)));
}

#[tokio::test]
async fn test_resume_from_checkpoint_leaves_earlier_rows_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("videos.csv");
    let mut content = String::from("title,url,manifest\n");
    for i in 0..8 {
        let previous = if i < 5 { "kept" } else { "" };
        content.push_str(&format!("video {},{},{}\n", i, video_url(i), previous));
    }
    std::fs::write(&path, content).unwrap();

    let config = test_config(&path, 2, 5);
    CheckpointStore::for_table(&config.table).write(5).unwrap();

    let extractor = Arc::new(Scripted::default());
    let summary = BatchRunner::new(config, extractor.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.resume_from, 5);
    assert_eq!(summary.tasks, 3);
    let mut called: Vec<usize> = extractor.calls().iter().map(|u| row_index(u)).collect();
    called.sort_unstable();
    assert_eq!(called, vec![5, 6, 7]);

    let written = manifests(&path);
    assert!(written[..5].iter().all(|m| m == "kept"));
    assert_eq!(written[7], manifest_for(&video_url(7)));
}

#[tokio::test]
async fn test_explicit_start_overrides_checkpoint() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 6, &[]);

    let mut config = test_config(&path, 1, 5);
    CheckpointStore::for_table(&config.table).write(5).unwrap();
    config.runner.resume_from = Some(2);

    let extractor = Arc::new(Scripted::default());
    let summary = BatchRunner::new(config, extractor.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.resume_from, 2);
    assert_eq!(extractor.calls().len(), 4);
    assert_eq!(manifests(&path)[1], "");
}

#[tokio::test]
async fn test_running_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 7, &[2]);

    let runner = BatchRunner::new(test_config(&path, 3, 5), Arc::new(Scripted::default()));
    runner.run().await.unwrap();
    let first = std::fs::read_to_string(&path).unwrap();
    assert!(!runner.checkpoint().exists());

    let extractor = Arc::new(Scripted::default());
    let runner = BatchRunner::new(test_config(&path, 3, 5), extractor.clone());
    let summary = runner.run().await.unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    // no checkpoint left, so every row with a url is extracted again
    assert_eq!(summary.resume_from, 0);
    assert_eq!(extractor.calls().len(), 6);
    assert_eq!(first, second);
    assert!(!runner.checkpoint().exists());
}

#[tokio::test]
async fn test_columns_preserved_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("videos.csv");
    std::fs::write(
        &path,
        "id,url,notes\n1,https://example.com/video/0,first\n2,https://example.com/video/1\n",
    )
    .unwrap();

    let runner = BatchRunner::new(test_config(&path, 2, 5), Arc::new(Scripted::default()));
    runner.run().await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("id,url,notes,manifest"));
    assert_eq!(
        lines.next(),
        Some("1,https://example.com/video/0,first,https://example.com/video/0/master.m3u8")
    );
    assert_eq!(
        lines.next(),
        Some("2,https://example.com/video/1,,https://example.com/video/1/master.m3u8")
    );
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_checkpoint_never_passes_unfinished_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 14, &[]);
    let config = test_config(&path, 2, 100);

    let extractor = Arc::new(Scripted {
        // row 0 stays in flight while the other worker finishes rows 1..9
        slow: vec![(video_url(0), Duration::from_millis(300))],
        checkpoint: Some(config.table.checkpoint_path()),
        ..Scripted::default()
    });

    BatchRunner::new(config, extractor.clone())
        .run()
        .await
        .unwrap();

    let samples = extractor.samples.lock().unwrap().clone();
    assert_eq!(samples.len(), 14);
    for (row, checkpoint) in &samples {
        let value = checkpoint.unwrap_or(0);
        assert!(
            value <= *row,
            "checkpoint {} passed row {} while it was still running",
            value,
            row
        );
        if *row >= 10 {
            assert!(value >= 10, "checkpoint {} went backwards at row {}", value, row);
        }
    }
}

#[tokio::test]
async fn test_persistence_failures_do_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let table_dir = dir.path().join("work");
    std::fs::create_dir(&table_dir).unwrap();
    let path = write_videos(&table_dir, 6, &[]);

    let extractor = Arc::new(Scripted {
        remove_on_first_call: Some(table_dir.clone()),
        ..Scripted::default()
    });

    let summary = BatchRunner::new(test_config(&path, 2, 2), extractor.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.flushes, 0);
    // three periodic saves plus the final one
    assert_eq!(summary.flush_failures, 4);
    assert_eq!(summary.checkpoint_failures, 6);
    assert!(!summary.completed);
}

#[tokio::test]
async fn test_interval_flush_without_count_threshold() {
    let dir = TempDir::new().unwrap();
    let path = write_videos(dir.path(), 3, &[]);

    let mut config = test_config(&path, 1, 100);
    config.runner.flush_interval_secs = 1;
    let extractor = Arc::new(Scripted {
        slow: vec![(video_url(1), Duration::from_millis(1100))],
        ..Scripted::default()
    });

    let summary = BatchRunner::new(config, extractor).run().await.unwrap();

    // one save when row 1 lands past the interval, then the final one
    assert_eq!(summary.flushes, 2);
    assert_eq!(summary.flush_failures, 0);
    assert!(summary.completed);
}

#[tokio::test]
async fn test_failed_interval_flush_is_retried_on_next_completion() {
    let dir = TempDir::new().unwrap();
    let table_dir = dir.path().join("work");
    std::fs::create_dir(&table_dir).unwrap();
    let path = write_videos(&table_dir, 3, &[]);

    let mut config = test_config(&path, 1, 100);
    config.runner.flush_interval_secs = 1;
    let extractor = Arc::new(Scripted {
        slow: vec![(video_url(0), Duration::from_millis(1100))],
        remove_on_first_call: Some(table_dir.clone()),
        ..Scripted::default()
    });

    let summary = BatchRunner::new(config, extractor).run().await.unwrap();

    // every completion after the interval tries again, plus the final save
    assert_eq!(summary.flushes, 0);
    assert_eq!(summary.flush_failures, 4);
    assert!(!summary.completed);
}

#[tokio::test]
async fn test_missing_url_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("videos.csv");
    std::fs::write(&path, "title,link\na,https://example.com/\n").unwrap();

    let extractor = Arc::new(Scripted::default());
    let result = BatchRunner::new(test_config(&path, 2, 5), extractor.clone())
        .run()
        .await;

    assert!(result.is_err());
    assert!(extractor.calls().is_empty());
}
