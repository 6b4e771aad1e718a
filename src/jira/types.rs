use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A `{value, label}` pair shown by a selector. `value` is the stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            avatar_url: None,
        }
    }

    /// Option used when the backend did not return the selected entity
    pub fn raw(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// Error payload embedded in a backend response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// The `{data, error}` envelope every plugin endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<Vec<T>>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ApiError {
                message: message.into(),
            }),
        }
    }
}

/// Avatar size keys used in `avatarUrls`
pub const AVATAR_SMALL: &str = "24x24";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub avatar_urls: HashMap<String, String>,
}

impl JiraUser {
    /// Some Jira deployments only populate `accountId`
    pub fn id(&self) -> &str {
        if self.key.is_empty() {
            self.account_id.as_deref().unwrap_or("")
        } else {
            &self.key
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionTarget {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: TransitionTarget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

/// An installed or connected Jira instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Project list for one instance, as served by the plugin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub projects: Vec<SelectOption>,
    #[serde(default)]
    pub default_project_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_with_error_payload() {
        let resp: ApiResponse<JiraUser> =
            serde_json::from_str(r#"{"error": {"message": "issue not found"}}"#).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.error.unwrap().message, "issue not found");
    }

    #[test]
    fn test_api_response_for_transitions_and_issues() {
        let resp: ApiResponse<Transition> = serde_json::from_str(
            r#"{"data": [{"id": "31", "name": "Start", "to": {"name": "In Progress"}}]}"#,
        )
        .unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data[0].to.name, "In Progress");
        assert!(resp.error.is_none());

        let resp: ApiResponse<Transition> = serde_json::from_str("{}").unwrap();
        assert!(resp.data.is_none());

        let resp: ApiResponse<Issue> = serde_json::from_str(
            r#"{"data": [{"key": "PROJ-7", "fields": {"summary": "Fix login"}}, {"key": "PROJ-8"}]}"#,
        )
        .unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data[0].fields.summary, "Fix login");
        assert_eq!(data[1].fields.summary, "");

        let resp: ApiResponse<Issue> =
            serde_json::from_str(r#"{"error": {"message": "bad jql"}}"#).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.error.unwrap().message, "bad jql");
    }

    #[test]
    fn test_jira_user_camel_case_fields() {
        let json = r#"{
            "key": "jdoe",
            "displayName": "Jane Doe",
            "avatarUrls": {"24x24": "https://example.com/a.png"}
        }"#;
        let user: JiraUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id(), "jdoe");
        assert_eq!(user.display_name, "Jane Doe");
        assert_eq!(
            user.avatar_urls.get(AVATAR_SMALL).map(String::as_str),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_jira_user_falls_back_to_account_id() {
        let json = r#"{"accountId": "5b10a2844c20165700ede21g", "displayName": "Cloud User"}"#;
        let user: JiraUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id(), "5b10a2844c20165700ede21g");
    }

    #[test]
    fn test_raw_option_uses_value_as_label() {
        let opt = SelectOption::raw("PROJ-12");
        assert_eq!(opt.value, "PROJ-12");
        assert_eq!(opt.label, "PROJ-12");
    }
}
