use crate::jira::types::*;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Query for `get_assignees`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeParams {
    pub issue_key: String,
    pub instance_id: String,
    pub q: String,
}

/// Query for `get_transitions`. Transitions are not searchable server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionParams {
    pub issue_key: String,
    pub instance_id: String,
}

/// Query for `search_issues`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSearchParams {
    pub fields: String,
    pub q: String,
    pub instance_id: String,
}

/// Fields requested when searching issues for a selector
pub const ISSUE_SEARCH_FIELDS: &str = "key,summary";

/// Backend calls the host makes on behalf of the selectors and forms.
///
/// An `Err` means the call itself failed (transport). A response carrying
/// `error` means the plugin answered with a failure.
#[async_trait]
pub trait JiraApi: Send + Sync {
    async fn get_assignees(&self, params: AssigneeParams) -> Result<ApiResponse<JiraUser>>;

    async fn get_transitions(&self, params: TransitionParams) -> Result<ApiResponse<Transition>>;

    async fn search_issues(&self, params: IssueSearchParams) -> Result<ApiResponse<Issue>>;

    /// Issue keys mentioned in a thread, most relevant first
    async fn issue_keys_for_post(&self, root_id: &str, user_input: &str) -> Result<Vec<String>>;

    async fn project_metadata(&self, instance_id: &str) -> Result<ProjectMetadata>;
}
