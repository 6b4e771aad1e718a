use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::FutureExt;
use lazyjira::config::Config;
use lazyjira::jira::{ApiResponse, Issue, JiraUser, SelectOption, Transition};
use lazyjira::metadata::IssueMetadata;
use lazyjira::selector::{self, AsyncOptionSelector, NarrowBy, OptionMapper, SearchFn};
use lazyjira::subscription::{conflict_message, event_options, self_role_options};
use lazyjira::compute_conflicts;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lazyjira")]
#[command(about = "Inspect Jira selector payloads and subscription filter conflicts")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.config/lazyjira/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether adding issue types conflicts with selected field filters
    Conflicts {
        /// Issue metadata JSON (issue_types + fields)
        #[arg(long)]
        metadata: PathBuf,
        /// Issue type ids selected before the change
        #[arg(long, value_delimiter = ',')]
        previous: Vec<String>,
        /// Issue type ids selected after the change
        #[arg(long, value_delimiter = ',')]
        new: Vec<String>,
        /// Keys of the custom fields currently filtered on
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// List the events and roles a subscription can use
    Events {
        /// Issue metadata JSON, to include custom-field events
        #[arg(long)]
        metadata: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        projects: Vec<String>,
    },

    /// Show the configured instances and which one a new subscription starts on
    Instances {
        /// Instance ids the user has connected an account to
        #[arg(long, value_delimiter = ',')]
        connected: Vec<String>,
        /// Instance of a saved subscription being edited
        #[arg(long)]
        saved: Option<String>,
    },

    /// Run a saved backend response through a selector and print the options
    Options {
        #[arg(long, value_enum)]
        kind: SelectorKind,
        /// `{data, error}` response JSON as the plugin would return it
        #[arg(long)]
        response: PathBuf,
        /// Text typed into the selector
        #[arg(long, default_value = "")]
        query: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SelectorKind {
    Assignee,
    Transition,
    Issue,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = match &cli.config {
        Some(path) => (Config::from_path(path)?, Vec::new()),
        None => Config::load(),
    };

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.settings.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Commands::Conflicts {
            metadata,
            previous,
            new,
            fields,
        } => {
            let metadata = IssueMetadata::from_file(&metadata)?;
            let report = compute_conflicts(&fields, &previous, &new, &metadata);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(message) = conflict_message(&report) {
                eprintln!("{message}");
                std::process::exit(1);
            }
        }
        Commands::Events { metadata, projects } => {
            let metadata = metadata
                .as_deref()
                .map(IssueMetadata::from_file)
                .transpose()?;
            let output = serde_json::json!({
                "events": event_options(metadata.as_ref(), &projects),
                "self": self_role_options(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Instances { connected, saved } => {
            let picker = config.instance_picker(&connected, saved.as_deref());
            let output = serde_json::json!({
                "label": picker.label(),
                "visible": picker.is_visible(),
                "selected": picker.selected,
                "options": picker.options(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Options {
            kind,
            response,
            query,
        } => {
            let options = match kind {
                SelectorKind::Assignee => {
                    let to_option: OptionMapper<JiraUser> = Arc::new(selector::assignee_option);
                    run_selector::<JiraUser>("assignee", &response, to_option, None, &query, &config)
                        .await?
                }
                SelectorKind::Transition => {
                    let to_option: OptionMapper<Transition> =
                        Arc::new(selector::transition_option);
                    run_selector::<Transition>(
                        "transition",
                        &response,
                        to_option,
                        Some(NarrowBy::Label),
                        &query,
                        &config,
                    )
                    .await?
                }
                SelectorKind::Issue => {
                    let to_option: OptionMapper<Issue> = Arc::new(selector::issue_option);
                    run_selector::<Issue>("issue", &response, to_option, None, &query, &config)
                        .await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
    }

    Ok(())
}

/// Feed `query` through a debounced selector whose backend replays `response`
async fn run_selector<T>(
    name: &str,
    response: &Path,
    to_option: OptionMapper<T>,
    narrow: Option<NarrowBy>,
    query: &str,
    config: &Config,
) -> Result<Vec<SelectOption>>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let contents = std::fs::read_to_string(response)
        .with_context(|| format!("Failed to read {}", response.display()))?;
    let payload: Arc<serde_json::Value> =
        Arc::new(serde_json::from_str(&contents).context("Response is not valid JSON")?);

    let search: SearchFn<T> = Arc::new(move |_q: String| {
        let payload = payload.clone();
        async move {
            serde_json::from_value::<ApiResponse<T>>((*payload).clone())
                .context("Response does not match the selector's payload shape")
        }
        .boxed()
    });

    let mut selector = AsyncOptionSelector::new(name, search, to_option)
        .with_debounce(config.settings.search_debounce())
        .on_error(|has_error| {
            if has_error {
                tracing::warn!("selector switched to read-only mode");
            }
        });
    if let Some(key) = narrow {
        selector = selector.narrow_by(key);
    }

    selector.input_changed(query);
    selector.next_update().await;
    if selector.has_error() {
        anyhow::bail!("The backend response was rejected; see the log above");
    }
    Ok(selector.options().to_vec())
}
