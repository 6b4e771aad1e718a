use crate::jira::JiraApi;
use serde::Serialize;

/// Payload for attaching a chat message to an issue as a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachCommentRequest {
    pub post_id: String,
    pub current_team: String,
    #[serde(rename = "issueKey")]
    pub issue_key: String,
    pub instance_id: String,
}

/// Placeholder input that makes the backend return every key in the thread
const ANY_KEY_INPUT: &str = "_";

#[derive(Debug, Clone, Default)]
pub struct AttachCommentForm {
    pub post_id: String,
    pub root_post_id: Option<String>,
    pub current_team: String,
    pub instance_id: Option<String>,
    pub issue_key: Option<String>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl AttachCommentForm {
    pub fn new(post_id: &str, root_post_id: Option<&str>, current_team: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            root_post_id: root_post_id.filter(|id| !id.is_empty()).map(str::to_string),
            current_team: current_team.to_string(),
            ..Self::default()
        }
    }

    /// Preselect the first issue key mentioned in the thread, if any
    pub async fn prefill_issue_key(&mut self, api: &dyn JiraApi) {
        let Some(root_id) = self.root_post_id.clone() else {
            return;
        };

        match api.issue_keys_for_post(&root_id, ANY_KEY_INPUT).await {
            Ok(keys) => {
                if let Some(key) = keys.first() {
                    self.set_issue_key(&key.to_uppercase());
                }
            }
            Err(e) => tracing::warn!(root_id = %root_id, "Failed to look up thread issue keys: {e:#}"),
        }
    }

    pub fn set_instance(&mut self, instance_id: &str) {
        self.instance_id = Some(instance_id.to_string()).filter(|id| !id.is_empty());
    }

    pub fn set_issue_key(&mut self, issue_key: &str) {
        self.issue_key = Some(issue_key.to_string()).filter(|key| !key.is_empty());
    }

    /// The issue selector is shown once an instance is chosen
    pub fn shows_issue_selector(&self) -> bool {
        self.instance_id.is_some()
    }

    pub fn can_submit(&self) -> bool {
        self.instance_id.is_some() && self.issue_key.is_some() && !self.submitting
    }

    pub fn submit(&mut self) -> Option<AttachCommentRequest> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        Some(AttachCommentRequest {
            post_id: self.post_id.clone(),
            current_team: self.current_team.clone(),
            issue_key: self.issue_key.clone()?,
            instance_id: self.instance_id.clone()?,
        })
    }

    /// Record the backend's answer. Returns true when the form should close.
    pub fn submit_finished(&mut self, error: Option<String>) -> bool {
        match error {
            Some(message) => {
                self.submitting = false;
                self.error = Some(message);
                false
            }
            None => true,
        }
    }
}
