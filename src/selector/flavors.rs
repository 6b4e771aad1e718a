use super::{AsyncOptionSelector, NarrowBy, OptionMapper, SearchFn};
use crate::jira::*;
use futures::FutureExt;
use std::sync::Arc;

pub fn assignee_option(user: &JiraUser) -> SelectOption {
    SelectOption {
        value: user.id().to_string(),
        label: user.display_name.clone(),
        avatar_url: user
            .avatar_urls
            .get(AVATAR_SMALL)
            .filter(|url| !url.is_empty())
            .cloned(),
    }
}

pub fn transition_option(transition: &Transition) -> SelectOption {
    SelectOption::new(
        transition.id.clone(),
        format!("{} → {}", transition.name, transition.to.name),
    )
}

pub fn issue_option(issue: &Issue) -> SelectOption {
    SelectOption::new(
        issue.key.clone(),
        format!("{}: {}", issue.key, issue.fields.summary),
    )
}

/// Users that can be assigned to `issue_key`, searched by name
pub fn assignee_selector(
    api: Arc<dyn JiraApi>,
    instance_id: &str,
    issue_key: &str,
) -> AsyncOptionSelector<JiraUser> {
    let instance_id = instance_id.to_string();
    let issue_key = issue_key.to_string();
    let search: SearchFn<JiraUser> = Arc::new(move |q: String| {
        let api = api.clone();
        let params = AssigneeParams {
            issue_key: issue_key.clone(),
            instance_id: instance_id.clone(),
            q,
        };
        async move { api.get_assignees(params).await }.boxed()
    });
    let to_option: OptionMapper<JiraUser> = Arc::new(assignee_option);
    AsyncOptionSelector::new("assignee", search, to_option)
}

/// Workflow transitions available on `issue_key`.
///
/// The backend returns every transition; a typed query must match a label exactly.
pub fn transition_selector(
    api: Arc<dyn JiraApi>,
    instance_id: &str,
    issue_key: &str,
) -> AsyncOptionSelector<Transition> {
    let instance_id = instance_id.to_string();
    let issue_key = issue_key.to_string();
    let search: SearchFn<Transition> = Arc::new(move |_q: String| {
        let api = api.clone();
        let params = TransitionParams {
            issue_key: issue_key.clone(),
            instance_id: instance_id.clone(),
        };
        async move { api.get_transitions(params).await }.boxed()
    });
    let to_option: OptionMapper<Transition> = Arc::new(transition_option);
    AsyncOptionSelector::new("transition", search, to_option).narrow_by(NarrowBy::Label)
}

/// Issues on `instance_id` whose text contains the query
pub fn issue_selector(api: Arc<dyn JiraApi>, instance_id: &str) -> AsyncOptionSelector<Issue> {
    let instance_id = instance_id.to_string();
    let search: SearchFn<Issue> = Arc::new(move |q: String| {
        let api = api.clone();
        let params = IssueSearchParams {
            fields: ISSUE_SEARCH_FIELDS.to_string(),
            q: q.trim().to_string(),
            instance_id: instance_id.clone(),
        };
        async move { api.search_issues(params).await }.boxed()
    });
    let to_option: OptionMapper<Issue> = Arc::new(issue_option);
    AsyncOptionSelector::new("issue", search, to_option)
}
