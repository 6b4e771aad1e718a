//! Searchable select control backed by an asynchronous backend query.
//!
//! The host owns the selected value and feeds it in with [`AsyncOptionSelector::set_value`].
//! Keystrokes go through [`AsyncOptionSelector::input_changed`], which debounces and
//! runs the search on a background task. Results come back over a channel and are
//! applied by [`AsyncOptionSelector::poll`] (non-blocking, for a draw loop) or
//! [`AsyncOptionSelector::next_update`] (awaiting). Every background request carries
//! an id; only the latest one is ever applied.

pub mod flavors;

use crate::error::SelectorError;
use crate::jira::{ApiResponse, SelectOption};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub use flavors::*;

/// Quiet period before a keystroke turns into a backend call
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Backend search, with the selector's identity parameters already bound
pub type SearchFn<T> =
    Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<ApiResponse<T>>> + Send + Sync>;

/// Maps one backend entity to a display option
pub type OptionMapper<T> = Arc<dyn Fn(&T) -> SelectOption + Send + Sync>;

/// Receives `true` when the selector enters the error state and `false` when it leaves it
pub type ErrorCallback = Box<dyn FnMut(bool) + Send>;

/// Which option key a non-empty query must equal after the backend answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowBy {
    Label,
    Value,
}

/// Current selection, as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectedValue {
    #[default]
    None,
    Single(String),
    Multi(Vec<String>),
}

impl SelectedValue {
    /// An empty string and an empty multi-selection count as no value
    pub fn is_empty(&self) -> bool {
        match self {
            SelectedValue::None => true,
            SelectedValue::Single(v) => v.is_empty(),
            SelectedValue::Multi(vs) => vs.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            SelectedValue::None => vec![],
            SelectedValue::Single(v) if v.is_empty() => vec![],
            SelectedValue::Single(v) => vec![v.as_str()],
            SelectedValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for SelectedValue {
    fn from(value: &str) -> Self {
        SelectedValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for SelectedValue {
    fn from(values: Vec<String>) -> Self {
        SelectedValue::Multi(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// User typed into the search box
    Search,
    /// Label lookup for a host-supplied value
    Resolve,
}

struct SearchOutcome {
    kind: RequestKind,
    request_id: u64,
    result: Result<Vec<SelectOption>, SelectorError>,
}

/// The fetch-map-narrow pipeline, cloneable into background tasks
struct OptionSource<T> {
    search: SearchFn<T>,
    to_option: OptionMapper<T>,
    narrow: Option<NarrowBy>,
}

impl<T> Clone for OptionSource<T> {
    fn clone(&self) -> Self {
        Self {
            search: self.search.clone(),
            to_option: self.to_option.clone(),
            narrow: self.narrow,
        }
    }
}

impl<T: Send + 'static> OptionSource<T> {
    async fn fetch(&self, query: &str) -> Result<Vec<SelectOption>, SelectorError> {
        let response = (self.search)(query.to_string()).await?;
        if let Some(err) = response.error {
            return Err(SelectorError::backend(err.message));
        }

        let mut seen = HashSet::new();
        Ok(response
            .data
            .unwrap_or_default()
            .iter()
            .map(|item| (self.to_option)(item))
            .filter(|opt| seen.insert(opt.value.clone()))
            .filter(|opt| self.keeps(opt, query))
            .collect())
    }

    fn keeps(&self, opt: &SelectOption, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        match self.narrow {
            None => true,
            Some(NarrowBy::Label) => opt.label == query,
            Some(NarrowBy::Value) => opt.value == query,
        }
    }
}

pub struct AsyncOptionSelector<T> {
    name: String,
    source: OptionSource<T>,
    debounce: Duration,
    multi: bool,

    // Host-owned selection and the labels resolved for it
    value: SelectedValue,
    resolved: Vec<SelectOption>,
    resolved_for: Option<SelectedValue>,

    // Search state
    query: String,
    options: Vec<SelectOption>,
    loading: bool,
    has_error: bool,
    on_error: Option<ErrorCallback>,

    // Request tracking
    next_request_id: u64,
    latest_search: Arc<AtomicU64>,
    latest_resolve: u64,
    mounted: bool,
    tx: mpsc::Sender<SearchOutcome>,
    rx: Option<mpsc::Receiver<SearchOutcome>>,
}

impl<T: Send + 'static> AsyncOptionSelector<T> {
    pub fn new(name: impl Into<String>, search: SearchFn<T>, to_option: OptionMapper<T>) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            name: name.into(),
            source: OptionSource {
                search,
                to_option,
                narrow: None,
            },
            debounce: SEARCH_DEBOUNCE,
            multi: false,
            value: SelectedValue::None,
            resolved: Vec::new(),
            resolved_for: None,
            query: String::new(),
            options: Vec::new(),
            loading: false,
            has_error: false,
            on_error: None,
            next_request_id: 0,
            latest_search: Arc::new(AtomicU64::new(0)),
            latest_resolve: 0,
            mounted: true,
            tx,
            rx: Some(rx),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn narrow_by(mut self, key: NarrowBy) -> Self {
        self.source.narrow = Some(key);
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(bool) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn value(&self) -> &SelectedValue {
        &self.value
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Run a search right away, bypassing the debounce.
    ///
    /// Failures are logged and reported through the error callback; the
    /// caller just gets an empty list.
    pub async fn search(&mut self, query: &str) -> Vec<SelectOption> {
        self.report_error(false);
        let result = self.source.fetch(query).await;
        self.settle(query, result)
    }

    /// Fetch labels for the current value. Makes no backend call when nothing is selected.
    pub async fn resolve_initial_value(&mut self) -> Vec<SelectOption> {
        if self.value.is_empty() {
            return Vec::new();
        }

        let options = self.search("").await;
        if self.mounted {
            self.resolved = options.clone();
            self.resolved_for = Some(self.value.clone());
        }
        options
    }

    /// Debounced entry point for keystrokes. Must be called inside a tokio runtime.
    pub fn input_changed(&mut self, query: impl Into<String>) {
        if !self.mounted {
            return;
        }

        self.query = query.into();
        self.report_error(false);
        self.loading = true;

        let request_id = self.issue_request_id();
        self.latest_search.store(request_id, Ordering::SeqCst);

        let source = self.source.clone();
        let latest = self.latest_search.clone();
        let tx = self.tx.clone();
        let query = self.query.clone();
        let debounce = self.debounce;
        let name = self.name.clone();

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != request_id {
                tracing::trace!(selector = %name, request_id, "search superseded during debounce");
                return;
            }

            tracing::debug!(selector = %name, request_id, query = %query, "searching");
            let result = source.fetch(&query).await;
            // Receiver gone means the selector was unmounted
            let _ = tx
                .send(SearchOutcome {
                    kind: RequestKind::Search,
                    request_id,
                    result,
                })
                .await;
        });
    }

    /// Accept a new value from the host.
    ///
    /// A non-empty value that has no cached label triggers one background
    /// lookup. The same value is never looked up twice in a row.
    pub fn set_value(&mut self, value: impl Into<SelectedValue>) {
        let value = self.normalize(value.into());
        self.value = value.clone();

        if !self.mounted || value.is_empty() || self.resolved_for.as_ref() == Some(&value) {
            return;
        }
        self.resolved_for = Some(value.clone());

        // Keep labels picked from search results; the next search replaces `options`
        let cached: Option<Vec<SelectOption>> = value
            .values()
            .into_iter()
            .map(|v| self.cached_option(v).cloned())
            .collect();
        if let Some(found) = cached {
            self.resolved = found;
            return;
        }

        let request_id = self.issue_request_id();
        self.latest_resolve = request_id;

        let source = self.source.clone();
        let tx = self.tx.clone();
        let name = self.name.clone();

        tokio::spawn(async move {
            tracing::debug!(selector = %name, request_id, "resolving selected value");
            let result = source.fetch("").await;
            let _ = tx
                .send(SearchOutcome {
                    kind: RequestKind::Resolve,
                    request_id,
                    result,
                })
                .await;
        });
    }

    /// Apply finished background requests without blocking. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut outcomes = Vec::new();
        if let Some(rx) = &mut self.rx {
            while let Ok(outcome) = rx.try_recv() {
                outcomes.push(outcome);
            }
        }

        let mut changed = false;
        for outcome in outcomes {
            changed |= self.apply(outcome).is_some();
        }
        changed
    }

    /// Wait for the next background result that is still current and apply it.
    ///
    /// Stale results are dropped along the way. Returns `None` once the
    /// selector is unmounted.
    pub async fn next_update(&mut self) -> Option<RequestKind> {
        loop {
            let outcome = self.rx.as_mut()?.recv().await?;
            if let Some(kind) = self.apply(outcome) {
                return Some(kind);
            }
        }
    }

    /// Stop accepting results. In-flight requests finish but are never applied.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
        self.rx = None;
        // Wake any debouncing task into noticing it lost
        let request_id = self.issue_request_id();
        self.latest_search.store(request_id, Ordering::SeqCst);
        tracing::debug!(selector = %self.name, "unmounted");
    }

    /// Display options for the current value, falling back to the raw value
    pub fn selected_options(&self) -> Vec<SelectOption> {
        self.value
            .values()
            .into_iter()
            .map(|v| {
                self.cached_option(v)
                    .cloned()
                    .unwrap_or_else(|| SelectOption::raw(v))
            })
            .collect()
    }

    /// A required selector is valid only with a non-empty value
    pub fn is_valid(&self, required: bool) -> bool {
        !required || !self.value.is_empty()
    }

    /// Fit the host's value to the selector's mode
    fn normalize(&self, value: SelectedValue) -> SelectedValue {
        match (self.multi, value) {
            (false, SelectedValue::Multi(values)) => {
                if values.len() > 1 {
                    tracing::warn!(
                        selector = %self.name,
                        count = values.len(),
                        "single-value selector given several values, keeping the first"
                    );
                }
                values
                    .into_iter()
                    .next()
                    .map(SelectedValue::Single)
                    .unwrap_or(SelectedValue::None)
            }
            (true, SelectedValue::Single(v)) if !v.is_empty() => SelectedValue::Multi(vec![v]),
            (_, value) => value,
        }
    }

    fn cached_option(&self, value: &str) -> Option<&SelectOption> {
        self.resolved
            .iter()
            .chain(self.options.iter())
            .find(|opt| opt.value == value)
    }

    fn issue_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn apply(&mut self, outcome: SearchOutcome) -> Option<RequestKind> {
        if !self.mounted {
            return None;
        }

        let current = match outcome.kind {
            RequestKind::Search => self.latest_search.load(Ordering::SeqCst),
            RequestKind::Resolve => self.latest_resolve,
        };
        if outcome.request_id != current {
            tracing::debug!(
                selector = %self.name,
                request_id = outcome.request_id,
                latest = current,
                "discarding stale result"
            );
            return None;
        }

        match outcome.kind {
            RequestKind::Search => {
                self.loading = false;
                let query = self.query.clone();
                self.options = self.settle(&query, outcome.result);
            }
            RequestKind::Resolve => {
                self.resolved = self.settle("", outcome.result);
            }
        }
        Some(outcome.kind)
    }

    /// Turn a fetch result into options, routing failures to the error channel
    fn settle(
        &mut self,
        query: &str,
        result: Result<Vec<SelectOption>, SelectorError>,
    ) -> Vec<SelectOption> {
        match result {
            Ok(options) => options,
            Err(err) => {
                match &err {
                    SelectorError::Backend { .. } => {
                        tracing::warn!(selector = %self.name, query = %query, "{err}")
                    }
                    SelectorError::Transport(_) => {
                        tracing::error!(selector = %self.name, query = %query, "{err}")
                    }
                }
                if self.mounted {
                    self.report_error(true);
                }
                Vec::new()
            }
        }
    }

    fn report_error(&mut self, has_error: bool) {
        if self.has_error == has_error {
            return;
        }
        self.has_error = has_error;
        if let Some(callback) = &mut self.on_error {
            callback(has_error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Mutex;
    use tokio::time::timeout;

    #[derive(Debug, Clone)]
    struct Item {
        id: String,
        name: String,
    }

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn to_option() -> OptionMapper<Item> {
        Arc::new(|i: &Item| SelectOption::new(i.id.clone(), i.name.clone()))
    }

    /// Backend double: records every query and answers after a per-query delay
    #[derive(Clone, Default)]
    struct FakeBackend {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBackend {
        fn search_fn(
            &self,
            respond: impl Fn(&str) -> (u64, anyhow::Result<ApiResponse<Item>>) + Send + Sync + 'static,
        ) -> SearchFn<Item> {
            let calls = self.calls.clone();
            Arc::new(move |q: String| {
                calls.lock().unwrap().push(q.clone());
                let (delay_ms, result) = respond(&q);
                async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    result
                }
                .boxed()
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn echo_backend(backend: &FakeBackend) -> SearchFn<Item> {
        backend.search_fn(|q| {
            (
                10,
                Ok(ApiResponse::ok(vec![
                    item(&format!("{q}-1"), &format!("{q} one")),
                    item(&format!("{q}-2"), &format!("{q} two")),
                ])),
            )
        })
    }

    fn error_log() -> (Arc<Mutex<Vec<bool>>>, impl FnMut(bool) + Send + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        (log, move |e| sink.lock().unwrap().push(e))
    }

    #[tokio::test]
    async fn test_search_returns_unique_values_in_backend_order() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|_| {
            (
                0,
                Ok(ApiResponse::ok(vec![
                    item("b", "Bravo"),
                    item("a", "Alpha"),
                    item("b", "Bravo again"),
                ])),
            )
        });
        let mut selector = AsyncOptionSelector::new("test", search, to_option());

        let options = selector.search("al").await;
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["b", "a"], "duplicates dropped, order kept");
        assert_eq!(backend.calls(), vec!["al"]);
    }

    #[tokio::test]
    async fn test_backend_error_reports_and_returns_empty() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|_| (0, Ok(ApiResponse::err("permission denied"))));
        let (errors, on_error) = error_log();
        let mut selector = AsyncOptionSelector::new("test", search, to_option()).on_error(on_error);

        assert!(selector.search("x").await.is_empty());
        assert!(selector.has_error());
        assert_eq!(*errors.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_transport_error_uses_same_channel() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|_| (0, Err(anyhow::anyhow!("connection refused"))));
        let (errors, on_error) = error_log();
        let mut selector = AsyncOptionSelector::new("test", search, to_option()).on_error(on_error);

        assert!(selector.search("x").await.is_empty());
        assert_eq!(*errors.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_resolve_initial_value_skips_backend_when_empty() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());

        assert!(selector.resolve_initial_value().await.is_empty());

        let mut multi =
            AsyncOptionSelector::new("multi", echo_backend(&backend), to_option()).multi(true);
        multi.value = SelectedValue::Multi(vec![]);
        assert!(multi.resolve_initial_value().await.is_empty());

        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_initial_value_searches_once_with_empty_query() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());
        selector.value = SelectedValue::from("-1");

        let options = selector.resolve_initial_value().await;
        assert_eq!(options.len(), 2);
        assert_eq!(backend.calls(), vec![""]);
        assert_eq!(selector.selected_options(), vec![SelectOption::new("-1", " one")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_keystrokes() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());

        for query in ["j", "ji", "jir", "jira"] {
            selector.input_changed(query);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(selector.is_loading());

        let kind = timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();
        assert_eq!(kind, Some(RequestKind::Search));
        assert_eq!(backend.calls(), vec!["jira"]);
        assert_eq!(selector.options()[0].value, "jira-1");
        assert!(!selector.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_does_not_overwrite_newer_one() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|q| {
            let delay = if q == "a" { 2_000 } else { 10 };
            (delay, Ok(ApiResponse::ok(vec![item(q, q)])))
        });
        let mut selector = AsyncOptionSelector::new("test", search, to_option());

        selector.input_changed("a");
        tokio::time::sleep(Duration::from_millis(500)).await;
        selector.input_changed("ab");
        // Let both requests finish: "ab" first, then the slow "a"
        tokio::time::sleep(Duration::from_millis(3_000)).await;

        assert_eq!(backend.calls(), vec!["a", "ab"]);
        assert!(selector.poll());
        assert_eq!(selector.options(), &[SelectOption::new("ab", "ab")]);
        assert!(!selector.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_fetch_discards_result() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|q| (1_000, Ok(ApiResponse::ok(vec![item(q, q)]))));
        let mut selector = AsyncOptionSelector::new("test", search, to_option());

        selector.input_changed("abc");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(backend.calls(), vec!["abc"], "request is in flight");

        selector.unmount();
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        assert!(!selector.poll());
        assert!(selector.options().is_empty());
        assert_eq!(selector.next_update().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_debounce_skips_backend() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());

        selector.input_changed("abc");
        selector.unmount();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_value_resolves_once_per_distinct_value() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());

        selector.set_value("-2");
        selector.set_value("-2");
        let kind = timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();
        assert_eq!(kind, Some(RequestKind::Resolve));
        assert_eq!(selector.selected_options(), vec![SelectOption::new("-2", " two")]);

        selector.set_value("-2");
        // "-1" came back with the first lookup, so no new request is needed
        selector.set_value("-1");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.calls(), vec![""]);
        assert_eq!(selector.selected_options()[0].label, " one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_picked_label_survives_next_search() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());

        selector.input_changed("jira");
        timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();
        selector.set_value("jira-1");
        assert_eq!(selector.selected_options()[0].label, "jira one");

        selector.input_changed("other");
        timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();
        assert_eq!(selector.options()[0].value, "other-1");
        assert_eq!(selector.selected_options(), vec![SelectOption::new("jira-1", "jira one")]);
        assert_eq!(backend.calls(), vec!["jira", "other"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_follows_selector_mode() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|_| {
            (0, Ok(ApiResponse::ok(vec![item("a", "A"), item("b", "B")])))
        });
        let mut single = AsyncOptionSelector::new("single", search.clone(), to_option());
        single.set_value(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(single.value(), &SelectedValue::Single("a".to_string()));
        single.set_value(Vec::<String>::new());
        assert_eq!(single.value(), &SelectedValue::None);

        let mut multi = AsyncOptionSelector::new("multi", search, to_option()).multi(true);
        assert!(multi.is_multi());
        multi.set_value("b");
        assert_eq!(multi.value(), &SelectedValue::Multi(vec!["b".to_string()]));
        timeout(Duration::from_secs(5), multi.next_update())
            .await
            .unwrap();
        assert_eq!(multi.selected_options(), vec![SelectOption::new("b", "B")]);
    }

    #[tokio::test]
    async fn test_direct_search_clears_previous_error() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|q| {
            if q == "bad" {
                (0, Ok(ApiResponse::err("boom")))
            } else {
                (0, Ok(ApiResponse::ok(vec![item(q, q)])))
            }
        });
        let (errors, on_error) = error_log();
        let mut selector = AsyncOptionSelector::new("test", search, to_option()).on_error(on_error);

        assert!(selector.search("bad").await.is_empty());
        assert!(selector.has_error());
        assert_eq!(selector.search("good").await.len(), 1);
        assert!(!selector.has_error());
        assert_eq!(*errors.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_value_empty_makes_no_request() {
        let backend = FakeBackend::default();
        let mut selector =
            AsyncOptionSelector::new("test", echo_backend(&backend), to_option()).multi(true);

        selector.set_value(SelectedValue::None);
        selector.set_value(Vec::<String>::new());
        selector.set_value("");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(backend.calls().is_empty());
        assert!(selector.selected_options().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_value_falls_back_to_raw_label() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|_| (0, Ok(ApiResponse::ok(vec![]))));
        let mut selector = AsyncOptionSelector::new("test", search, to_option());
        selector.value = SelectedValue::from("PROJ-9");

        selector.resolve_initial_value().await;
        assert_eq!(selector.selected_options(), vec![SelectOption::raw("PROJ-9")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_cleared_when_input_changes() {
        let backend = FakeBackend::default();
        let search = backend.search_fn(|q| {
            if q == "bad" {
                (0, Ok(ApiResponse::err("boom")))
            } else {
                (0, Ok(ApiResponse::ok(vec![item(q, q)])))
            }
        });
        let (errors, on_error) = error_log();
        let mut selector = AsyncOptionSelector::new("test", search, to_option()).on_error(on_error);

        selector.input_changed("bad");
        timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();
        assert!(selector.has_error());

        selector.input_changed("good");
        assert!(!selector.has_error());
        timeout(Duration::from_secs(5), selector.next_update())
            .await
            .unwrap();

        assert_eq!(*errors.lock().unwrap(), vec![true, false]);
        assert_eq!(selector.options()[0].value, "good");
    }

    #[tokio::test]
    async fn test_narrowing_by_label_and_value() {
        let backend = FakeBackend::default();
        let items = || -> anyhow::Result<ApiResponse<Item>> {
            Ok(ApiResponse::ok(vec![
                item("11", "Start"),
                item("21", "Done"),
            ]))
        };
        let mut by_label =
            AsyncOptionSelector::new("label", backend.search_fn(move |_| (0, items())), to_option())
                .narrow_by(NarrowBy::Label);
        assert_eq!(by_label.search("Done").await, vec![SelectOption::new("21", "Done")]);
        assert_eq!(by_label.search("").await.len(), 2, "empty query is not narrowed");

        let mut by_value =
            AsyncOptionSelector::new("value", backend.search_fn(move |_| (0, items())), to_option())
                .narrow_by(NarrowBy::Value);
        assert_eq!(by_value.search("11").await, vec![SelectOption::new("11", "Start")]);
        assert!(by_value.search("Start").await.is_empty());
    }

    #[test]
    fn test_required_validation() {
        let backend = FakeBackend::default();
        let mut selector = AsyncOptionSelector::new("test", echo_backend(&backend), to_option());
        assert!(selector.is_valid(false));
        assert!(!selector.is_valid(true));
        selector.value = SelectedValue::from("PROJ-1");
        assert!(selector.is_valid(true));
    }
}
