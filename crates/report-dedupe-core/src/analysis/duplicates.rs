use super::fingerprint::{fingerprint, Fingerprint};
use crate::storage::models::Report;
use ahash::AHashMap;
use chrono::Duration;
use tracing::debug;

pub const DEFAULT_TOLERANCE_MINUTES: i64 = 15;

/// Two or more reports judged equivalent, ordered newest first.
///
/// The first member is the one kept by cleanup; the rest are removal
/// candidates. Built only through [`DuplicateGroup::new`], which enforces
/// both the minimum size and the ordering.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    fingerprint: Fingerprint,
    reports: Vec<Report>,
}

impl DuplicateGroup {
    /// Returns `None` for fewer than two members. Members are stable-sorted by
    /// `created_at` descending, so equal timestamps keep their given order.
    pub fn new(fingerprint: Fingerprint, mut reports: Vec<Report>) -> Option<Self> {
        if reports.len() < 2 {
            return None;
        }
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Some(Self {
            fingerprint,
            reports,
        })
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Partition reports into duplicate groups.
///
/// Grouping is anchor-relative: each unvisited report in input order becomes
/// an anchor and claims every later unvisited report with the same
/// fingerprint whose `created_at` lies within `tolerance` of the anchor's.
/// Membership is never chained through a non-anchor member.
pub fn find_duplicate_groups(reports: &[Report], tolerance: Duration) -> Vec<DuplicateGroup> {
    let fingerprints: Vec<Fingerprint> = reports.iter().map(fingerprint).collect();

    // Indices per fingerprint, ascending. Only same-fingerprint reports can
    // ever match, so the inner scan walks one bucket instead of the whole input.
    let mut buckets: AHashMap<&Fingerprint, Vec<usize>> = AHashMap::new();
    for (idx, fp) in fingerprints.iter().enumerate() {
        buckets.entry(fp).or_default().push(idx);
    }

    let mut visited = vec![false; reports.len()];
    let mut groups = Vec::new();

    for (anchor_idx, anchor) in reports.iter().enumerate() {
        if visited[anchor_idx] {
            continue;
        }
        visited[anchor_idx] = true;

        let fp = &fingerprints[anchor_idx];
        let mut members = vec![anchor.clone()];

        if let Some(bucket) = buckets.get(fp) {
            for &candidate_idx in bucket.iter().filter(|&&i| i > anchor_idx) {
                if visited[candidate_idx] {
                    continue;
                }
                let candidate = &reports[candidate_idx];
                if (candidate.created_at - anchor.created_at).abs() <= tolerance {
                    visited[candidate_idx] = true;
                    members.push(candidate.clone());
                }
            }
        }

        if let Some(group) = DuplicateGroup::new(fp.clone(), members) {
            debug!(
                "Duplicate group {} anchored at report {}: {} members",
                group.fingerprint(),
                anchor.id,
                group.len()
            );
            groups.push(group);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::AnswerValue;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    fn report(id: &str, content: &str, created_at: chrono::DateTime<Utc>) -> Report {
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), AnswerValue::Text(content.to_string()));
        Report {
            id: id.to_string(),
            title: String::new(),
            process_description: content.to_string(),
            file_content: String::new(),
            answers,
            report_data: serde_json::Value::Null,
            created_at,
        }
    }

    fn ids(group: &DuplicateGroup) -> Vec<&str> {
        group.reports().iter().map(|r| r.id.as_str()).collect()
    }

    fn tolerance() -> Duration {
        Duration::minutes(DEFAULT_TOLERANCE_MINUTES)
    }

    #[test]
    fn test_anchor_relative_worked_scenario() {
        let reports = vec![
            report("A", "h1", at(10, 0)),
            report("B", "h1", at(10, 5)),
            report("C", "h1", at(11, 0)),
            report("D", "h2", at(10, 2)),
        ];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["B", "A"]);
    }

    #[test]
    fn test_no_chaining_through_members() {
        // B is within tolerance of both A and C, but C is 20 minutes from anchor A
        let reports = vec![
            report("A", "h1", at(10, 0)),
            report("B", "h1", at(10, 10)),
            report("C", "h1", at(10, 20)),
        ];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["B", "A"]);
    }

    #[test]
    fn test_unmatched_report_becomes_later_anchor() {
        let reports = vec![
            report("A", "h1", at(10, 0)),
            report("C", "h1", at(11, 0)),
            report("B", "h1", at(10, 5)),
            report("E", "h1", at(11, 10)),
        ];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["B", "A"]);
        assert_eq!(ids(&groups[1]), vec!["E", "C"]);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let reports = vec![
            report("A", "h1", at(10, 0)),
            report("B", "h1", at(10, 15)),
            report("C", "h1", at(9, 44)),
        ];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["B", "A"]);
    }

    #[test]
    fn test_earlier_timestamps_later_in_input_are_matched() {
        let reports = vec![report("A", "h1", at(10, 10)), report("B", "h1", at(10, 0))];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(ids(&groups[0]), vec!["A", "B"]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let reports = vec![
            report("first", "h1", at(10, 0)),
            report("second", "h1", at(10, 0)),
            report("third", "h1", at(10, 0)),
        ];
        let groups = find_duplicate_groups(&reports, tolerance());
        assert_eq!(ids(&groups[0]), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_singletons_are_not_materialized() {
        let reports = vec![report("A", "h1", at(10, 0)), report("B", "h2", at(10, 0))];
        assert!(find_duplicate_groups(&reports, tolerance()).is_empty());
        assert!(find_duplicate_groups(&[], tolerance()).is_empty());
    }

    #[test]
    fn test_zero_tolerance_requires_identical_instants() {
        let reports = vec![
            report("A", "h1", at(10, 0)),
            report("B", "h1", at(10, 1)),
            report("C", "h1", at(10, 0)),
        ];
        let groups = find_duplicate_groups(&reports, Duration::zero());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["A", "C"]);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let reports: Vec<Report> = (0..40)
            .map(|i| report(&format!("r{}", i), &format!("h{}", i % 3), at(10, (i * 7 % 60) as u32)))
            .collect();
        let first: Vec<Vec<String>> = find_duplicate_groups(&reports, tolerance())
            .iter()
            .map(|g| g.reports().iter().map(|r| r.id.clone()).collect())
            .collect();
        for _ in 0..5 {
            let again: Vec<Vec<String>> = find_duplicate_groups(&reports, tolerance())
                .iter()
                .map(|g| g.reports().iter().map(|r| r.id.clone()).collect())
                .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_group_new_rejects_singletons() {
        let r = report("A", "h1", at(10, 0));
        assert!(DuplicateGroup::new(fingerprint(&r), vec![r]).is_none());
    }
}
