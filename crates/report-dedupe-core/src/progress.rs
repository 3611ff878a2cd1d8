/// Trait for reporting scan and cleanup progress.
///
/// The CLI implements it with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _total_reports: usize, _duplicate_groups: usize, _duration_secs: f64) {}
    fn on_cleanup_start(&self, _total: usize) {}
    /// Called once per settled batch. `processed` never exceeds `total`.
    fn on_cleanup_progress(&self, _processed: usize, _total: usize) {}
    fn on_cleanup_complete(&self, _deleted: usize, _failed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
