use crate::analysis::deletion::{BatchDeleter, DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE};
use crate::analysis::duplicates::{find_duplicate_groups, DuplicateGroup, DEFAULT_TOLERANCE_MINUTES};
use crate::analysis::retention::select_retention;
use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::ReportStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Scans one owner's reports for duplicates and removes all but the newest copy.
///
/// `scan` and `cleanup` share no state: the groups returned by one are passed
/// explicitly to the other.
pub struct CleanupEngine<S: ReportStore> {
    store: S,
    owner_id: String,
    tolerance: chrono::Duration,
    batch_size: usize,
    batch_pause: Duration,
    cancel_token: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub groups: Vec<DuplicateGroup>,
    pub total_reports: usize,
    pub duration: Duration,
}

impl ScanResult {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of reports a cleanup of these groups would delete.
    pub fn removal_count(&self) -> usize {
        self.groups.iter().map(|g| g.len() - 1).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
    /// One survivor per group.
    pub kept_count: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub failed_ids: Vec<String>,
    pub cancelled: bool,
    pub duration: Duration,
}

impl CleanupResult {
    pub fn requested_count(&self) -> usize {
        self.deleted_count + self.failed_count + self.skipped_count
    }
}

impl<S: ReportStore> CleanupEngine<S> {
    pub fn new(store: S, owner_id: &str) -> Self {
        Self {
            store,
            owner_id: owner_id.to_string(),
            tolerance: chrono::Duration::minutes(DEFAULT_TOLERANCE_MINUTES),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_millis(DEFAULT_BATCH_PAUSE_MS),
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(store, &config.owner_id)
            .with_tolerance(config.tolerance())
            .with_batch_size(config.batch_size)
            .with_batch_pause(config.batch_pause())
    }

    pub fn with_tolerance(mut self, tolerance: chrono::Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Setting the token stops a running cleanup at the next batch boundary.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// List the owner's reports and group the duplicates. Read-only.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<ScanResult, Error> {
        reporter.on_scan_start();
        let start = Instant::now();

        info!("Listing reports for owner '{}'...", self.owner_id);
        let reports = self
            .store
            .list(&self.owner_id)
            .map_err(|e| Error::Scan(Box::new(e)))?;

        let groups = find_duplicate_groups(&reports, self.tolerance);
        let duration = start.elapsed();

        let result = ScanResult {
            groups,
            total_reports: reports.len(),
            duration,
        };
        info!(
            "Scan completed in {:.2}s: {} reports, {} duplicate groups, {} removable",
            duration.as_secs_f64(),
            result.total_reports,
            result.group_count(),
            result.removal_count(),
        );
        reporter.on_scan_complete(
            result.total_reports,
            result.group_count(),
            duration.as_secs_f64(),
        );

        Ok(result)
    }

    /// Delete every non-kept member of `groups`.
    ///
    /// Groups are not re-validated against the store; call `scan` right before
    /// this. Individual delete failures land in `failed_ids` rather than
    /// failing the call.
    pub fn cleanup(
        &self,
        groups: &[DuplicateGroup],
        reporter: &dyn ProgressReporter,
    ) -> Result<CleanupResult, Error> {
        self.cancel_token.store(false, Ordering::Relaxed);
        let start = Instant::now();

        let mut kept_count = 0;
        let mut ids: Vec<String> = Vec::new();
        for group in groups {
            if let Some(decision) = select_retention(group) {
                debug!(
                    "Group {}: keeping {}, removing {}",
                    group.fingerprint(),
                    decision.keep.id,
                    decision.remove.len()
                );
                kept_count += 1;
                ids.extend(decision.remove_ids().map(str::to_string));
            }
        }

        info!(
            "Deleting {} duplicate reports in batches of {}...",
            ids.len(),
            self.batch_size
        );
        reporter.on_cleanup_start(ids.len());

        let summary = BatchDeleter::new(self.batch_size, self.batch_pause)
            .with_cancel_token(self.cancel_token())
            .run(&ids, |id| self.store.delete(&self.owner_id, id), reporter)?;
        let duration = start.elapsed();

        info!(
            "Cleanup completed in {:.2}s: {} kept, {} deleted, {} failed, {} skipped",
            duration.as_secs_f64(),
            kept_count,
            summary.deleted_count,
            summary.failed_count,
            summary.skipped_count,
        );
        reporter.on_cleanup_complete(
            summary.deleted_count,
            summary.failed_count,
            duration.as_secs_f64(),
        );

        Ok(CleanupResult {
            kept_count,
            deleted_count: summary.deleted_count,
            failed_count: summary.failed_count,
            skipped_count: summary.skipped_count,
            failed_ids: summary.failed_ids,
            cancelled: summary.cancelled,
            duration,
        })
    }
}
