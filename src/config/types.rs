use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for m3u8-sweep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runner: RunnerConfig,
    pub table: TableConfig,
    pub extractor: ExtractorConfig,
}

/// Batch execution settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunnerConfig {
    /// Number of extractions running at once within a sub-batch
    pub workers: usize,

    /// Flush the table after this many processed rows
    pub flush_every: usize,

    /// Flush the table when more than this many seconds passed since the last flush
    pub flush_interval_secs: u64,

    /// Explicit starting row; when unset the checkpoint (or 0) is used
    pub resume_from: Option<usize>,

    /// Extraction attempts per row before giving up
    pub max_retries: u32,

    /// Rows per sub-batch
    pub batch_size: usize,

    /// Delay between attempts on the same row (milliseconds)
    pub retry_delay_ms: u64,

    /// Pause between sub-batches (milliseconds)
    pub batch_pause_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            flush_every: 5,
            flush_interval_secs: 60,
            resume_from: None,
            max_retries: 3,
            batch_size: 10,
            retry_delay_ms: 2000,
            batch_pause_ms: 2000,
        }
    }
}

impl RunnerConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Table artifact settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TableConfig {
    /// Path to the CSV table
    pub path: PathBuf,

    /// Column holding the source page URL
    pub url_column: String,

    /// Column receiving the extracted manifest URL
    pub manifest_column: String,

    /// Suffix appended to the table path to name the checkpoint file
    pub checkpoint_suffix: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("consensus_test.csv"),
            url_column: "url".to_string(),
            manifest_column: "manifest".to_string(),
            checkpoint_suffix: ".checkpoint".to_string(),
        }
    }
}

impl TableConfig {
    /// Path of the checkpoint sidecar for this table
    pub fn checkpoint_path(&self) -> PathBuf {
        let mut raw = self.path.clone().into_os_string();
        raw.push(&self.checkpoint_suffix);
        PathBuf::from(raw)
    }
}

/// Settings for the built-in HTTP extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractorConfig {
    /// User-Agent header sent with page requests
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("m3u8-sweep/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}
