use super::duplicates::DuplicateGroup;
use crate::storage::models::Report;

/// Which member of a duplicate group survives, and which are removed.
#[derive(Debug, Clone, Copy)]
pub struct RetentionDecision<'a> {
    pub keep: &'a Report,
    pub remove: &'a [Report],
}

impl RetentionDecision<'_> {
    pub fn remove_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.remove.iter().map(|r| r.id.as_str())
    }
}

/// Keep the newest report. Groups are already ordered newest first, so this
/// is the first member. `None` only for an empty group.
pub fn select_retention(group: &DuplicateGroup) -> Option<RetentionDecision<'_>> {
    let (keep, remove) = group.reports().split_first()?;
    Some(RetentionDecision { keep, remove })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::duplicates::find_duplicate_groups;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn report(id: &str, minute: u32) -> Report {
        Report {
            id: id.to_string(),
            title: String::new(),
            process_description: "same".to_string(),
            file_content: String::new(),
            answers: HashMap::new(),
            report_data: serde_json::Value::Null,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_keep_is_newest_member() {
        let reports = vec![report("a", 1), report("b", 9), report("c", 4)];
        let groups = find_duplicate_groups(&reports, Duration::minutes(15));
        let decision = select_retention(&groups[0]).unwrap();

        assert_eq!(decision.keep.id, "b");
        assert_eq!(decision.remove_ids().collect::<Vec<_>>(), vec!["c", "a"]);
        for removed in decision.remove {
            assert!(decision.keep.created_at >= removed.created_at);
        }
    }

    #[test]
    fn test_tie_keeps_earliest_in_input_order() {
        let reports = vec![report("x", 5), report("y", 5)];
        let groups = find_duplicate_groups(&reports, Duration::minutes(15));
        let decision = select_retention(&groups[0]).unwrap();
        assert_eq!(decision.keep.id, "x");
        assert_eq!(decision.remove.len(), 1);
    }
}
