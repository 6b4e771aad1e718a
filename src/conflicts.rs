//! Detects custom-field filters that stop making sense when issue types are
//! added to a subscription.

use crate::metadata::{FieldMetadataEntry, IssueMetadata, IssueType};
use serde::Serialize;
use std::collections::HashSet;

/// A selected field and the newly added issue types that lack it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflict {
    pub field: FieldMetadataEntry,
    pub issue_types: Vec<IssueType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<FieldConflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.conflicts.iter().map(|c| c.field.name.as_str()).collect()
    }

    /// First conflicting issue type of the first conflicting field
    pub fn first_issue_type(&self) -> Option<&IssueType> {
        self.conflicts.first().and_then(|c| c.issue_types.first())
    }
}

/// Compute which selected field filters conflict with newly added issue types.
///
/// Only ids in `new_issue_types` that are absent from `previous_issue_types`
/// are checked. Fields are reported in `selected_fields` order and issue
/// types in `new_issue_types` order. Field keys unknown to `metadata` are
/// skipped.
pub fn compute_conflicts(
    selected_fields: &[String],
    previous_issue_types: &[String],
    new_issue_types: &[String],
    metadata: &IssueMetadata,
) -> ConflictReport {
    let previous: HashSet<&str> = previous_issue_types.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let added: Vec<&str> = new_issue_types
        .iter()
        .map(String::as_str)
        .filter(|id| !previous.contains(id) && seen.insert(*id))
        .collect();

    if added.is_empty() || selected_fields.is_empty() {
        return ConflictReport::default();
    }

    let mut reported = HashSet::new();
    let conflicts = selected_fields
        .iter()
        .filter(|key| reported.insert(key.as_str()))
        .filter_map(|key| metadata.field(key))
        .filter_map(|field| {
            let issue_types: Vec<IssueType> = added
                .iter()
                .filter(|id| !field.applies_to(id))
                .map(|id| metadata.issue_type(id))
                .collect();
            if issue_types.is_empty() {
                None
            } else {
                Some(FieldConflict {
                    field: field.clone(),
                    issue_types,
                })
            }
        })
        .collect();

    ConflictReport { conflicts }
}
