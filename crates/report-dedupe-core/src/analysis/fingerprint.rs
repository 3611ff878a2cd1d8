use crate::storage::models::{AnswerValue, Report};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher as _;
use twox_hash::XxHash64;

/// Canonical equality key over a report's content fields.
///
/// Built from `process_description`, `file_content` and `answers` only; id,
/// title, `report_data` and `created_at` never contribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short XxHash64 digest, for log lines and CLI output.
    pub fn digest(&self) -> String {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.0.as_bytes());
        format!("{:016x}", hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digest())
    }
}

/// Build the fingerprint for one report.
///
/// The output is canonical JSON: object keys in sorted order, no whitespace.
/// Answer keys are sorted before serialization, so two reports whose answers
/// were populated in different orders produce the same key.
pub fn fingerprint(report: &Report) -> Fingerprint {
    let answers: BTreeMap<&str, &AnswerValue> = report
        .answers
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();

    let mut out = String::with_capacity(
        report.process_description.len() + report.file_content.len() + 64,
    );
    out.push_str("{\"answers\":{");
    for (i, (key, value)) in answers.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_json_string(&mut out, key);
        out.push(':');
        push_answer(&mut out, value);
    }
    out.push_str("},\"fileContent\":");
    push_json_string(&mut out, &report.file_content);
    out.push_str(",\"processDescription\":");
    push_json_string(&mut out, &report.process_description);
    out.push('}');

    Fingerprint(out)
}

fn push_answer(out: &mut String, value: &AnswerValue) {
    match value {
        AnswerValue::Text(text) => push_json_string(out, text),
        AnswerValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_json_string(out, item);
            }
            out.push(']');
        }
    }
}

fn push_json_string(out: &mut String, s: &str) {
    out.push_str(&Value::from(s).to_string());
}
