use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::DeleteOutcome;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 50;
/// Upper bound on concurrent deletes, and so on pool threads.
pub const MAX_BATCH_SIZE: usize = 256;

/// Aggregated outcome of one deletion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    pub deleted_count: usize,
    pub failed_count: usize,
    /// Ids never attempted because the run was cancelled between batches.
    pub skipped_count: usize,
    /// Failing ids in request order.
    pub failed_ids: Vec<String>,
    pub cancelled: bool,
}

impl DeletionSummary {
    pub fn total(&self) -> usize {
        self.deleted_count + self.failed_count + self.skipped_count
    }
}

/// Deletes ids in fixed-size batches.
///
/// Every delete in a batch runs concurrently on a pool sized to the batch, and
/// the batch is joined before its outcomes are counted. Batches run one after
/// another with `pause` between them. A failed delete is recorded and never
/// stops the run; there is no retry.
pub struct BatchDeleter {
    batch_size: usize,
    pause: Duration,
    cancel_token: Option<Arc<AtomicBool>>,
}

impl Default for BatchDeleter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, Duration::from_millis(DEFAULT_BATCH_PAUSE_MS))
    }
}

impl BatchDeleter {
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            pause,
            cancel_token: None,
        }
    }

    /// Checked before each batch starts, never while one is in flight.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    pub fn run<F>(
        &self,
        ids: &[String],
        delete: F,
        reporter: &dyn ProgressReporter,
    ) -> Result<DeletionSummary, Error>
    where
        F: Fn(&str) -> DeleteOutcome + Sync,
    {
        let total = ids.len();
        let mut summary = DeletionSummary::default();
        if total == 0 {
            return Ok(summary);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.batch_size.min(total))
            .thread_name(|i| format!("report-delete-{}", i))
            .build()?;

        let batch_count = total.div_ceil(self.batch_size);
        let mut processed = 0;

        for (batch_idx, batch) in ids.chunks(self.batch_size).enumerate() {
            if self.is_cancelled() {
                summary.cancelled = true;
                summary.skipped_count = total - processed;
                info!(
                    "Cleanup cancelled before batch {}/{}: {} deletions skipped",
                    batch_idx + 1,
                    batch_count,
                    summary.skipped_count
                );
                break;
            }

            let outcomes: Vec<(&String, DeleteOutcome)> =
                pool.install(|| batch.par_iter().map(|id| (id, delete(id.as_str()))).collect());

            for (id, outcome) in outcomes {
                match outcome {
                    Ok(()) => summary.deleted_count += 1,
                    Err(e) => {
                        warn!("Failed to delete report {}: {}", id, e);
                        summary.failed_count += 1;
                        summary.failed_ids.push(id.clone());
                    }
                }
            }

            processed = ((batch_idx + 1) * self.batch_size).min(total);
            reporter.on_cleanup_progress(processed, total);
            debug!(
                "Batch {}/{} settled: {}/{} processed",
                batch_idx + 1,
                batch_count,
                processed,
                total
            );

            if batch_idx + 1 < batch_count && !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }

        Ok(summary)
    }
}
