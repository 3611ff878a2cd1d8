use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An answer to one workflow question: free text or a multi-select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

/// A stored report, as listed from the report store.
///
/// Field names serialize in camelCase to match the JSON the surrounding
/// application produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub process_description: String,
    #[serde(default)]
    pub file_content: String,
    #[serde(default)]
    pub answers: HashMap<String, AnswerValue>,
    #[serde(default)]
    pub report_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
