//! Record-level data-quality checks run before any derivation

use std::collections::HashSet;

use crate::analysis::model::Dataset;
use crate::core::error::{DataQualityIssue, IssueKind};

/// Check identifier uniqueness across the dataset
///
/// Each repeated identifier is reported once, at its second occurrence.
pub fn check_identifiers(dataset: &Dataset) -> Vec<DataQualityIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for object in &dataset.objects {
        if !seen.insert(object.id.as_str()) && reported.insert(object.id.as_str()) {
            issues.push(DataQualityIssue::new(&object.id, IssueKind::DuplicateObject));
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for hole in &dataset.holes {
        if hole.id.is_empty() {
            issues.push(DataQualityIssue::new(
                format!("hole of object {}", hole.object_id),
                IssueKind::MissingField { field: "hole_id" },
            ));
        } else if !seen.insert(hole.id.as_str()) && reported.insert(hole.id.as_str()) {
            issues.push(DataQualityIssue::new(&hole.id, IssueKind::DuplicateHole));
        }
    }

    issues
}
