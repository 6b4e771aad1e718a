//! Instance and project pickers. These work on option lists the host already
//! holds, so they only need local filtering.

use crate::jira::{Instance, JiraApi, ProjectMetadata, SelectOption};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Narrow a local option list by fuzzy label match, best score first.
/// An empty filter keeps every option in its original order.
pub fn fuzzy_filter<'a>(options: &'a [SelectOption], filter: &str) -> Vec<&'a SelectOption> {
    if filter.is_empty() {
        return options.iter().collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, usize, &SelectOption)> = options
        .iter()
        .enumerate()
        .filter_map(|(idx, opt)| {
            matcher
                .fuzzy_match(&opt.label, filter)
                .map(|score| (score, idx, opt))
        })
        .collect();
    // Stable on ties: keep original order
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, opt)| opt).collect()
}

pub fn instance_options(installed: &[Instance]) -> Vec<SelectOption> {
    installed
        .iter()
        .map(|i| {
            let label = i
                .alias
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or(&i.instance_id);
            SelectOption::new(i.instance_id.clone(), label)
        })
        .collect()
}

/// Pick the instance to start with
pub fn default_instance(
    selected: Option<&str>,
    connected: &[Instance],
    user_default: Option<&str>,
) -> Option<String> {
    if let Some(selected) = selected.filter(|s| !s.is_empty()) {
        return Some(selected.to_string());
    }
    if connected.len() == 1 {
        return Some(connected[0].instance_id.clone());
    }
    user_default
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct InstancePicker {
    pub installed: Vec<Instance>,
    pub connected: Vec<Instance>,
    pub selected: Option<String>,
    /// Saved subscriptions keep their instance
    pub locked: bool,
}

impl InstancePicker {
    pub fn new(
        installed: Vec<Instance>,
        connected: Vec<Instance>,
        saved: Option<&str>,
        user_default: Option<&str>,
    ) -> Self {
        let selected = default_instance(saved, &connected, user_default);
        Self {
            installed,
            connected,
            selected,
            locked: saved.is_some_and(|s| !s.is_empty()),
        }
    }

    /// Only worth showing when there is a real choice
    pub fn is_visible(&self) -> bool {
        self.connected.len() > 1 && self.installed.len() > 1
    }

    pub fn label(&self) -> &'static str {
        if self.locked {
            "Instance (saved)"
        } else {
            "Instance"
        }
    }

    pub fn options(&self) -> Vec<SelectOption> {
        instance_options(&self.installed)
    }

    /// Returns true when the selection actually changed
    pub fn select(&mut self, instance_id: &str) -> bool {
        if self.locked || self.selected.as_deref() == Some(instance_id) {
            return false;
        }
        self.selected = Some(instance_id.to_string());
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPicker {
    pub options: Vec<SelectOption>,
    pub selected: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    all_projects: bool,
}

impl ProjectPicker {
    pub fn new(selected: Vec<String>) -> Self {
        Self {
            selected,
            ..Self::default()
        }
    }

    /// Fetch the project list for an instance. Errors land in `self.error`.
    pub async fn load(&mut self, api: &dyn JiraApi, instance_id: &str) {
        self.loading = true;
        self.error = None;
        self.options.clear();

        match api.project_metadata(instance_id).await {
            Ok(metadata) => self.apply_metadata(metadata),
            Err(e) => {
                tracing::error!(instance_id, "Failed to load project metadata: {e:#}");
                self.error = Some(format!("{e:#}"));
            }
        }
        self.loading = false;
    }

    pub fn apply_metadata(&mut self, metadata: ProjectMetadata) {
        self.options = metadata.projects;
        if self.selected.is_empty() {
            if let Some(key) = metadata.default_project_key.filter(|k| !k.is_empty()) {
                self.selected = vec![key];
            }
        }
        self.all_projects =
            !self.selected.is_empty() && self.selected.len() == self.options.len();
    }

    pub fn all_projects(&self) -> bool {
        self.all_projects
    }

    /// Check or uncheck "All projects"
    pub fn set_all_projects(&mut self, checked: bool) {
        self.all_projects = checked;
        self.selected = if checked {
            self.options.iter().map(|o| o.value.clone()).collect()
        } else {
            Vec::new()
        };
    }

    pub fn select(&mut self, projects: Vec<String>) {
        self.selected = projects;
    }

    pub fn selected_options(&self) -> Vec<&SelectOption> {
        self.options
            .iter()
            .filter(|o| self.selected.contains(&o.value))
            .collect()
    }

    /// The multi-select is hidden while "All projects" is checked
    pub fn is_selector_visible(&self) -> bool {
        !self.all_projects
    }
}
