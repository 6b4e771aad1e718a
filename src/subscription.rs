//! Editing state for a channel subscription to issue events.

use crate::conflicts::{compute_conflicts, ConflictReport};
use crate::jira::SelectOption;
use crate::metadata::IssueMetadata;
use serde::{Deserialize, Serialize};

/// Events a subscription can listen for (value, label)
pub const EVENT_OPTIONS: &[(&str, &str)] = &[
    ("event_created", "Issue Created"),
    ("event_deleted", "Issue Deleted"),
    ("event_updated_resolved", "Issue Resolved"),
    ("event_created_comment", "Comment Created"),
    ("event_updated_comment", "Comment Updated"),
    ("event_deleted_comment", "Comment Deleted"),
    ("event_updated_any", "Issue Updated: Any"),
    ("event_updated_assignee", "Issue Updated: Assignee"),
    ("event_updated_attachment", "Issue Updated: Attachment"),
    ("event_updated_description", "Issue Updated: Description"),
    ("event_updated_fix_version", "Issue Updated: Fix Version"),
    ("event_updated_labels", "Issue Updated: Labels"),
    ("event_updated_priority", "Issue Updated: Priority"),
    ("event_updated_sprint", "Issue Updated: Sprint"),
    ("event_updated_status", "Issue Updated: Status"),
    ("event_updated_summary", "Issue Updated: Summary"),
    ("event_updated_components", "Issue Updated: Components"),
];

/// The subscriber's role on the issue
pub const SELF_ROLE_OPTIONS: &[(&str, &str)] = &[
    ("assignee", "Assignee"),
    ("reporter", "Reporter"),
    ("watcher", "Watcher"),
];

pub const MAX_NAME_LEN: usize = 100;

/// Built-in events followed by one "updated" event per custom field of the selected projects
pub fn event_options(metadata: Option<&IssueMetadata>, projects: &[String]) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = EVENT_OPTIONS
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect();

    if let Some(metadata) = metadata {
        options.extend(metadata.fields_for_projects(projects).into_iter().map(|f| {
            SelectOption::new(
                format!("event_updated_{}", f.key),
                format!("Issue Updated: Custom - {}", f.name),
            )
        }));
    }
    options
}

pub fn self_role_options() -> Vec<SelectOption> {
    SELF_ROLE_OPTIONS
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    #[default]
    IncludeAny,
    IncludeAll,
    ExcludeAny,
    Empty,
}

/// A constraint on one custom field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    pub key: String,
    #[serde(default)]
    pub inclusion: Inclusion,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilters {
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub issue_types: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FilterValue>,
    #[serde(default, rename = "self")]
    pub self_roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub channel_id: String,
    pub name: String,
    pub instance_id: String,
    pub filters: SubscriptionFilters,
}

/// Which multi-select a plain setting change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSetting {
    Events,
    SelfRoles,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Subscription name is required")]
    MissingName,
    #[error("Subscription name must be at most 100 characters")]
    NameTooLong,
    #[error("Select at least one project")]
    MissingProjects,
    #[error("Select at least one event")]
    MissingEvents,
    #[error("Select your role in the issues")]
    MissingRoles,
}

/// The message shown when an issue-type change is rejected
pub fn conflict_message(report: &ConflictReport) -> Option<String> {
    let issue_type = report.first_issue_type()?;
    let fields = report.field_names().join(", ");
    Some(format!(
        "Issue Type(s) \"{}\" does not have filter field(s): \"{}\".  \
         Please update the conflicting fields or create a separate subscription.",
        issue_type.name, fields
    ))
}

#[derive(Debug, Clone)]
pub struct SubscriptionEditor {
    pub channel_id: String,
    existing_id: Option<String>,
    pub name: String,
    pub instance_id: String,
    pub filters: SubscriptionFilters,
    pub metadata: Option<IssueMetadata>,
    pub conflict_error: Option<String>,
    pub error: Option<String>,
    pub submitting: bool,
}

impl SubscriptionEditor {
    pub fn create(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            existing_id: None,
            name: String::new(),
            instance_id: String::new(),
            filters: SubscriptionFilters::default(),
            metadata: None,
            conflict_error: None,
            error: None,
            submitting: false,
        }
    }

    pub fn edit(subscription: &ChannelSubscription) -> Self {
        Self {
            existing_id: subscription.id.clone(),
            name: subscription.name.clone(),
            instance_id: subscription.instance_id.clone(),
            filters: subscription.filters.clone(),
            ..Self::create(&subscription.channel_id)
        }
    }

    pub fn is_editing(&self) -> bool {
        self.existing_id.is_some()
    }

    pub fn header(&self) -> &'static str {
        if self.is_editing() {
            "Edit Jira Subscription"
        } else {
            "Add Jira Subscription"
        }
    }

    /// Events and roles only make sense once a project is chosen
    pub fn can_submit(&self) -> bool {
        !self.filters.projects.is_empty()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_metadata(&mut self, metadata: IssueMetadata) {
        self.metadata = Some(metadata);
    }

    pub fn event_options(&self) -> Vec<SelectOption> {
        event_options(self.metadata.as_ref(), &self.filters.projects)
    }

    pub fn change_instance(&mut self, instance_id: &str) {
        if instance_id == self.instance_id {
            return;
        }
        self.instance_id = instance_id.to_string();
        self.error = None;
        self.change_projects(Vec::new());
    }

    /// New projects invalidate every project-scoped filter
    pub fn change_projects(&mut self, projects: Vec<String>) {
        self.conflict_error = None;
        if !projects.is_empty() && projects == self.filters.projects {
            return;
        }
        self.filters = SubscriptionFilters {
            projects,
            self_roles: std::mem::take(&mut self.filters.self_roles),
            ..SubscriptionFilters::default()
        };
    }

    /// Apply an issue-type change unless it conflicts with selected field filters.
    ///
    /// Returns the report; when it is non-empty the previous issue types are kept.
    pub fn change_issue_types(&mut self, issue_types: Vec<String>) -> ConflictReport {
        let report = match &self.metadata {
            Some(metadata) => {
                let selected: Vec<String> =
                    self.filters.fields.iter().map(|f| f.key.clone()).collect();
                compute_conflicts(&selected, &self.filters.issue_types, &issue_types, metadata)
            }
            None => ConflictReport::default(),
        };

        if let Some(message) = conflict_message(&report) {
            tracing::debug!(fields = ?report.field_names(), "issue type change blocked");
            self.conflict_error = Some(message);
            return report;
        }

        self.filters.issue_types = issue_types;
        self.conflict_error = None;
        report
    }

    pub fn change_setting(&mut self, setting: FilterSetting, values: Vec<String>) {
        match setting {
            FilterSetting::Events => self.filters.events = values,
            FilterSetting::SelfRoles => self.filters.self_roles = values,
        }
        self.conflict_error = None;
    }

    pub fn change_fields(&mut self, fields: Vec<FilterValue>) {
        self.filters.fields = fields;
        self.conflict_error = None;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong);
        }
        if self.filters.projects.is_empty() {
            return Err(ValidationError::MissingProjects);
        }
        if self.filters.events.is_empty() {
            return Err(ValidationError::MissingEvents);
        }
        if self.filters.self_roles.is_empty() {
            return Err(ValidationError::MissingRoles);
        }
        Ok(())
    }

    /// Validate and build the payload to send. Marks the editor as submitting.
    pub fn submit(&mut self) -> Result<ChannelSubscription, ValidationError> {
        self.validate()?;
        self.submitting = true;
        self.error = None;
        Ok(ChannelSubscription {
            id: self.existing_id.clone(),
            channel_id: self.channel_id.clone(),
            name: self.name.trim().to_string(),
            instance_id: self.instance_id.clone(),
            filters: self.filters.clone(),
        })
    }

    /// Record the backend's answer to a submit
    pub fn submit_finished(&mut self, error: Option<String>) {
        self.submitting = false;
        if let Some(message) = error {
            tracing::warn!(channel_id = %self.channel_id, "saving subscription failed: {message}");
            self.error = Some(message);
        }
    }
}
