use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub id: String,
    pub name: String,
}

/// One custom field and the issue types it exists on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadataEntry {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub applicable_issue_types: BTreeSet<String>,
    /// Projects whose create screens carry this field (empty = all)
    #[serde(default)]
    pub projects: BTreeSet<String>,
}

impl FieldMetadataEntry {
    pub fn applies_to(&self, issue_type_id: &str) -> bool {
        self.applicable_issue_types.contains(issue_type_id)
    }

    fn in_any_project(&self, projects: &[String]) -> bool {
        self.projects.is_empty() || projects.iter().any(|p| self.projects.contains(p))
    }
}

/// Issue types and custom fields for the projects of one instance, fetched by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    #[serde(default)]
    pub issue_types: Vec<IssueType>,
    #[serde(default)]
    pub fields: Vec<FieldMetadataEntry>,
}

impl IssueMetadata {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse issue metadata")
    }

    pub fn field(&self, key: &str) -> Option<&FieldMetadataEntry> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Look up an issue type, synthesizing one named after its id when unknown
    pub fn issue_type(&self, id: &str) -> IssueType {
        self.issue_types
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or_else(|| IssueType {
                id: id.to_string(),
                name: id.to_string(),
            })
    }

    /// Custom fields available to the given projects, in metadata order
    pub fn fields_for_projects(&self, projects: &[String]) -> Vec<&FieldMetadataEntry> {
        self.fields
            .iter()
            .filter(|f| f.in_any_project(projects))
            .collect()
    }
}
