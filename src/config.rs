use crate::jira::Instance;
use crate::pickers::InstancePicker;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub instances: Vec<InstanceConfig>,
    pub default_instance: Option<String>,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quiet period before a search keystroke hits the backend (ms)
    pub search_debounce_ms: u64,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub instance_id: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_debounce_ms: 400,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Config {
    /// Load the first readable config, falling back to defaults.
    ///
    /// Invalid files are skipped and returned as warnings, since this runs
    /// before logging is set up.
    pub fn load() -> (Self, Vec<String>) {
        Self::load_first(&Self::candidate_paths())
    }

    fn load_first(paths: &[PathBuf]) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        for path in paths {
            if let Ok(contents) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&contents) {
                    Ok(config) => return (config, warnings),
                    Err(e) => {
                        warnings.push(format!("Ignoring invalid config {}: {e}", path.display()))
                    }
                }
            }
        }
        (Config::default(), warnings)
    }

    /// Load an explicitly named config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        // 1. XDG style (~/.config/lazyjira/config.toml), common on macOS too
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("lazyjira").join("config.toml"));
        }
        // 2. Platform config dir (~/Library/Application Support/ on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("lazyjira").join("config.toml"));
        }
        // 3. ~/.lazyjira.toml
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".lazyjira.toml"));
        }
        paths
    }

    pub fn installed_instances(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|i| Instance {
                instance_id: i.instance_id.clone(),
                alias: i.alias.clone(),
            })
            .collect()
    }

    /// Instance picker over the configured instances. `connected` lists the
    /// ids the user has linked; `saved` is the instance of a saved subscription.
    pub fn instance_picker(&self, connected: &[String], saved: Option<&str>) -> InstancePicker {
        let installed = self.installed_instances();
        let connected = installed
            .iter()
            .filter(|i| connected.contains(&i.instance_id))
            .cloned()
            .collect();
        InstancePicker::new(installed, connected, saved, self.default_instance.as_deref())
    }
}
