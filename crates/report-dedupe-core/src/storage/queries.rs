use super::models::Report;
use super::sqlite::SqliteReportStore;
use super::{DeleteOutcome, ReportStore};
use crate::error::Error;
use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::{debug, error};

/// Upsert within one owner's collection. Another owner's row with the same id is untouched.
const INSERT_REPORT_SQL: &str = "INSERT INTO report \
     (id, owner_id, title, process_description, file_content, answers, report_data, created_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
     ON CONFLICT(owner_id, id) DO UPDATE SET \
     title = excluded.title, \
     process_description = excluded.process_description, \
     file_content = excluded.file_content, \
     answers = excluded.answers, \
     report_data = excluded.report_data, \
     created_at = excluded.created_at";

/// Raw column values, converted to a `Report` outside the rusqlite row closure.
struct ReportRow {
    id: String,
    title: String,
    process_description: String,
    file_content: String,
    answers: String,
    report_data: String,
    created_at: String,
}

impl ReportRow {
    fn into_report(self) -> Result<Report, Error> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                Error::Other(format!(
                    "Invalid created_at '{}' for report {}: {}",
                    self.created_at, self.id, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Report {
            answers: serde_json::from_str(&self.answers)?,
            report_data: serde_json::from_str(&self.report_data)?,
            id: self.id,
            title: self.title,
            process_description: self.process_description,
            file_content: self.file_content,
            created_at,
        })
    }
}

impl SqliteReportStore {
    /// Insert a report for `owner_id`, replacing that owner's row with the same id.
    pub fn insert_report(&self, owner_id: &str, report: &Report) -> Result<(), Error> {
        let answers = serde_json::to_string(&report.answers)?;
        let report_data = serde_json::to_string(&report.report_data)?;
        self.connection()?.execute(
            INSERT_REPORT_SQL,
            params![
                report.id,
                owner_id,
                report.title,
                report.process_description,
                report.file_content,
                answers,
                report_data,
                report.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert many reports in a single transaction. Returns the number written.
    pub fn insert_reports(&self, owner_id: &str, reports: &[Report]) -> Result<usize, Error> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_REPORT_SQL)?;
            for report in reports {
                let answers = serde_json::to_string(&report.answers)?;
                let report_data = serde_json::to_string(&report.report_data)?;
                stmt.execute(params![
                    report.id,
                    owner_id,
                    report.title,
                    report.process_description,
                    report.file_content,
                    answers,
                    report_data,
                    report.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        debug!("Inserted {} reports for owner '{}'", reports.len(), owner_id);
        Ok(reports.len())
    }

    pub fn count_reports(&self, owner_id: &str) -> Result<i64, Error> {
        let count = self.connection()?.query_row(
            "SELECT COUNT(*) FROM report WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All reports for an owner, in insertion order.
    pub fn list_reports(&self, owner_id: &str) -> Result<Vec<Report>, Error> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, process_description, file_content, answers, report_data, created_at \
             FROM report WHERE owner_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok(ReportRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    process_description: row.get(2)?,
                    file_content: row.get(3)?,
                    answers: row.get(4)?,
                    report_data: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(ReportRow::into_report).collect()
    }

    /// Returns whether a row was removed.
    pub fn delete_report(&self, owner_id: &str, id: &str) -> Result<bool, Error> {
        let affected = self.connection()?.execute(
            "DELETE FROM report WHERE owner_id = ?1 AND id = ?2",
            params![owner_id, id],
        )?;
        Ok(affected > 0)
    }
}

impl ReportStore for SqliteReportStore {
    fn list(&self, owner_id: &str) -> Result<Vec<Report>, Error> {
        self.list_reports(owner_id)
    }

    fn delete(&self, owner_id: &str, id: &str) -> DeleteOutcome {
        match self.delete_report(owner_id, id) {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(
                    "Report {} of owner '{}' already absent, treating delete as success",
                    id, owner_id
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete report {} of owner '{}': {}", id, owner_id, e);
                Err(e.to_string())
            }
        }
    }
}
