//! Per-task retry with a constant delay

use crate::extractor::ManifestExtractor;
use crate::table::Task;
use std::sync::Arc;
use std::time::Duration;

/// How many times a task is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// What a worker hands back to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Original row index
    pub index: usize,

    /// Attempts made, between 1 and the policy maximum
    pub attempts: u32,

    /// Manifest URL, `None` when every attempt failed
    pub manifest: Option<String>,
}

impl TaskOutcome {
    /// Value written to the manifest column
    pub fn value(&self) -> &str {
        self.manifest.as_deref().unwrap_or("")
    }

    pub fn is_found(&self) -> bool {
        self.manifest.is_some()
    }
}

/// Runs the extractor for `task` until it yields a manifest or attempts run out
///
/// Errors, an empty result and a panicking extractor all count as one failed
/// attempt. The delay only happens between attempts, never after the last.
pub async fn extract_with_retry(
    extractor: &Arc<dyn ManifestExtractor>,
    task: &Task,
    policy: &RetryPolicy,
) -> TaskOutcome {
    let mut attempts = 0;

    loop {
        attempts += 1;

        let call = {
            let extractor = Arc::clone(extractor);
            let url = task.url.clone();
            tokio::spawn(async move { extractor.extract_manifest_url(&url).await })
        };

        let failure = match call.await {
            Ok(Ok(Some(manifest))) if !manifest.trim().is_empty() => {
                return TaskOutcome {
                    index: task.index,
                    attempts,
                    manifest: Some(manifest.trim().to_string()),
                };
            }
            Ok(Ok(_)) => "no manifest found".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("extractor task aborted: {}", e),
        };

        tracing::warn!(
            "Task {} failed (attempt {}/{}): {}",
            task.index + 1,
            attempts,
            policy.max_attempts,
            failure
        );

        if attempts >= policy.max_attempts {
            tracing::warn!(
                "Task {} reached max attempts, skipping: {}",
                task.index + 1,
                task.url
            );
            return TaskOutcome {
                index: task.index,
                attempts,
                manifest: None,
            };
        }

        tracing::debug!("Retrying task {} in {:?}", task.index + 1, policy.delay);
        tokio::time::sleep(policy.delay).await;
    }
}
