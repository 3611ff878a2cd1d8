use super::models::Report;
use crate::error::Error;
use std::fs;
use std::path::Path;
use tracing::info;

/// Read a JSON array of reports (camelCase fields) from disk.
pub fn load_reports_json(path: &Path) -> Result<Vec<Report>, Error> {
    let raw = fs::read_to_string(path)?;
    let reports: Vec<Report> = serde_json::from_str(&raw)?;
    info!("Loaded {} reports from {}", reports.len(), path.display());
    Ok(reports)
}
