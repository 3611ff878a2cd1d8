pub mod import;
pub mod models;
mod queries;
pub mod sqlite;

pub use models::{AnswerValue, Report};
pub use sqlite::SqliteReportStore;

use crate::error::Error;

/// Outcome of a single delete call. `Err` carries the store's message.
pub type DeleteOutcome = Result<(), String>;

/// The two operations the cleanup engine needs from wherever reports live.
///
/// Report ids are unique only within one owner, so `delete` is scoped by the
/// same owner as `list`. It must be idempotent: removing an id that is
/// already gone is `Ok`.
pub trait ReportStore: Send + Sync {
    fn list(&self, owner_id: &str) -> Result<Vec<Report>, Error>;
    fn delete(&self, owner_id: &str, id: &str) -> DeleteOutcome;
}
