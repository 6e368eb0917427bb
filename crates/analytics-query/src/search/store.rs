//! Server side accumulator for one search session.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use super::key::QueryKey;
use super::lifespan::{Lifespan, LifespanInfo, ResultStoreSettings};
use super::request::{Fetch, OffsetRange, ResultRequest, SearchRequestSource};
use super::response::{ErrorMessage, Row, TableResult};
use crate::cancel::{CancellationToken, SearchVersionTracker};
use crate::error::{QueryError, Result};
use crate::expression::DocRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub rows_added: u64,
    pub elapsed_ms: u64,
}

/// Summary of a store, as listed by `ResultStoreManager::find`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStoreInfo {
    pub source: SearchRequestSource,
    pub key: QueryKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DocRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// RFC 3339 creation time.
    pub creation_time: String,
    pub node_name: String,
    /// Rows held across all components.
    pub store_size: u64,
    pub complete: bool,
    pub task_progress: TaskProgress,
    pub search_process_lifespan: LifespanInfo,
    pub store_lifespan: LifespanInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindResultStoreCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

impl FindResultStoreCriteria {
    pub fn matches(&self, info: &ResultStoreInfo) -> bool {
        let owner_matches = self
            .owner
            .as_ref()
            .map_or(true, |owner| info.owner.as_ref() == Some(owner));
        let complete_matches = self.complete.map_or(true, |complete| info.complete == complete);
        owner_matches && complete_matches
    }
}

/// What the sweep should do with a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiry {
    Keep,
    TerminateProcess,
    Destroy,
}

/// Point-in-time view of a store returned to a polling client.
#[derive(Debug)]
pub(crate) struct StoreSnapshot {
    pub results: Vec<TableResult>,
    pub highlights: Vec<String>,
    pub errors: Vec<ErrorMessage>,
    pub complete: bool,
}

#[derive(Debug)]
struct StoreState {
    settings: ResultStoreSettings,
    process_lifespan: Lifespan,
    store_lifespan: Lifespan,
    tables: HashMap<String, Vec<Row>>,
    /// Rows already handed to each component, for `Fetch::Changes`.
    delivered: HashMap<String, usize>,
    highlights: BTreeSet<String>,
    errors: Vec<ErrorMessage>,
    rows_added: u64,
    complete: bool,
    terminated: bool,
    last_access: Instant,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
pub(crate) struct ResultStore {
    key: QueryKey,
    source: SearchRequestSource,
    data_source: Option<DocRef>,
    owner: Option<String>,
    node_name: String,
    created: DateTime<Utc>,
    started: Instant,
    tracker: SearchVersionTracker,
    /// Issued before the store is published, so a terminate racing the
    /// start of execution still cancels it.
    execution: CancellationToken,
    state: Mutex<StoreState>,
    finished: Condvar,
}

impl ResultStore {
    pub fn new(
        key: QueryKey,
        source: SearchRequestSource,
        data_source: Option<DocRef>,
        owner: Option<String>,
        node_name: String,
        settings: ResultStoreSettings,
    ) -> Result<Self> {
        let (process_lifespan, store_lifespan) = settings.parse()?;
        let now = Instant::now();
        let tracker = SearchVersionTracker::new();
        let execution = tracker.current_token();
        Ok(Self {
            key,
            source,
            data_source,
            owner,
            node_name,
            created: Utc::now(),
            started: now,
            tracker,
            execution,
            state: Mutex::new(StoreState {
                settings,
                process_lifespan,
                store_lifespan,
                tables: HashMap::new(),
                delivered: HashMap::new(),
                highlights: BTreeSet::new(),
                errors: Vec::new(),
                rows_added: 0,
                complete: false,
                terminated: false,
                last_access: now,
                finished_at: None,
            }),
            finished: Condvar::new(),
        })
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Token for the one execution this store gets.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.execution.clone()
    }

    /// A store with no owner is visible to everyone, as is any store to a
    /// caller that gives no identity.
    pub fn is_visible_to(&self, user: Option<&str>) -> bool {
        match (self.owner.as_deref(), user) {
            (Some(owner), Some(user)) => owner == user,
            _ => true,
        }
    }

    pub fn touch(&self) {
        self.state.lock().last_access = Instant::now();
    }

    pub fn process_lifespan(&self) -> Lifespan {
        self.state.lock().process_lifespan
    }

    pub fn store_lifespan(&self) -> Lifespan {
        self.state.lock().store_lifespan
    }

    /// Blocks until the search completes or `timeout` elapses.
    /// Returns whether the search is complete.
    pub fn wait_for_completion(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while !state.complete {
            let timed_out = match deadline {
                Some(deadline) => self.finished.wait_until(&mut state, deadline).timed_out(),
                None => {
                    self.finished.wait(&mut state);
                    false
                }
            };
            if timed_out {
                break;
            }
        }
        state.complete
    }

    /// Records the outcome of the search execution.
    pub fn finish(&self, outcome: Result<()>) {
        let mut state = self.state.lock();
        if let Err(error) = outcome {
            if !state.terminated {
                state.errors.push(ErrorMessage::error(error.to_string()));
            }
        }
        state.complete = true;
        state.finished_at.get_or_insert_with(Instant::now);
        drop(state);
        self.finished.notify_all();
    }

    /// Cancels the running search and keeps the rows gathered so far.
    pub fn terminate(&self) {
        self.tracker.next_version();
        let mut state = self.state.lock();
        let was_running = !state.complete;
        state.terminated = true;
        state.complete = true;
        state.finished_at.get_or_insert_with(Instant::now);
        drop(state);
        self.finished.notify_all();
        if was_running {
            log::info!("search terminated key={}", self.key);
        }
    }

    /// Cancels the search and releases everything held.
    pub fn destroy(&self) {
        self.terminate();
        let mut state = self.state.lock();
        state.tables.clear();
        state.delivered.clear();
        state.highlights.clear();
    }

    pub fn update(&self, settings: ResultStoreSettings) -> Result<()> {
        let (process_lifespan, store_lifespan) = settings.parse()?;
        let mut state = self.state.lock();
        state.settings = settings;
        state.process_lifespan = process_lifespan;
        state.store_lifespan = store_lifespan;
        state.last_access = Instant::now();
        Ok(())
    }

    /// Store lifespan is checked first: an expired store is destroyed. An
    /// expired search process on a store that lives on is only terminated.
    pub fn expiry(&self, now: Instant) -> Expiry {
        let state = self.state.lock();
        let age = now.saturating_duration_since(self.started);
        let idle = now.saturating_duration_since(state.last_access);
        if state.store_lifespan.is_expired(age, idle) {
            return Expiry::Destroy;
        }
        if !state.complete && state.process_lifespan.is_expired(age, idle) {
            return Expiry::TerminateProcess;
        }
        Expiry::Keep
    }

    /// Collects the rows each request asks for and updates delivery
    /// bookkeeping for `Fetch::Changes`.
    pub fn snapshot(&self, requests: &[ResultRequest]) -> StoreSnapshot {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let rows = state
                .tables
                .get(&request.component_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let total = rows.len();
            let delivered = state
                .delivered
                .entry(request.component_id.clone())
                .or_insert(0);

            let (start, end) = match request.fetch {
                Fetch::None => (0, 0),
                Fetch::All => request
                    .requested_range
                    .map_or((0, total), |range| range.bounds(total)),
                Fetch::Changes => ((*delivered).min(total), total),
            };
            if request.fetch != Fetch::None {
                *delivered = (*delivered).max(end);
            }

            results.push(TableResult {
                component_id: request.component_id.clone(),
                rows: rows[start..end].to_vec(),
                result_range: OffsetRange::new(start as u64, (end - start) as u64),
                total_results: Some(total as u64),
            });
        }

        StoreSnapshot {
            results,
            highlights: state.highlights.iter().cloned().collect(),
            errors: state.errors.clone(),
            complete: state.complete,
        }
    }

    pub fn info(&self) -> ResultStoreInfo {
        let state = self.state.lock();
        let store_size = state.tables.values().map(|rows| rows.len() as u64).sum();
        let elapsed = state
            .finished_at
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.started);
        ResultStoreInfo {
            source: self.source.clone(),
            key: self.key.clone(),
            data_source: self.data_source.clone(),
            owner: self.owner.clone(),
            creation_time: self.created.to_rfc3339(),
            node_name: self.node_name.clone(),
            store_size,
            complete: state.complete,
            task_progress: TaskProgress {
                rows_added: state.rows_added,
                elapsed_ms: elapsed.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            search_process_lifespan: state.settings.search_process_lifespan.clone(),
            store_lifespan: state.settings.store_lifespan.clone(),
        }
    }
}

/// Write side of a result store handed to the search provider.
///
/// Writes made after the search was cancelled are discarded.
#[derive(Debug, Clone)]
pub struct ResultSink {
    store: Arc<ResultStore>,
    token: CancellationToken,
}

impl ResultSink {
    pub(crate) fn new(store: Arc<ResultStore>, token: CancellationToken) -> Self {
        Self { store, token }
    }

    pub fn key(&self) -> &QueryKey {
        self.store.key()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Appends rows for a component. Returns false if the search was cancelled.
    pub fn add_rows(&self, component_id: &str, rows: Vec<Row>) -> bool {
        let mut state = self.store.state.lock();
        if self.token.is_cancelled() {
            return false;
        }
        state.rows_added += rows.len() as u64;
        state
            .tables
            .entry(component_id.to_string())
            .or_default()
            .extend(rows);
        true
    }

    pub fn add_row(&self, component_id: &str, row: Row) -> bool {
        self.add_rows(component_id, vec![row])
    }

    pub fn add_highlights<I>(&self, highlights: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.store.state.lock();
        if self.token.is_cancelled() {
            return false;
        }
        state.highlights.extend(highlights);
        true
    }

    /// Records a non-fatal problem to report alongside the results.
    pub fn add_warning(&self, message: impl Into<String>) -> bool {
        let mut state = self.store.state.lock();
        if self.token.is_cancelled() {
            return false;
        }
        state.errors.push(ErrorMessage::warning(message));
        true
    }

    /// Returns `Err` once cancelled, for use with `?` inside providers.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(QueryError::SearchFailed(format!(
                "search {} was terminated",
                self.store.key()
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<ResultStore> {
        Arc::new(
            ResultStore::new(
                QueryKey::new("k"),
                SearchRequestSource::default(),
                None,
                Some("alice".to_string()),
                "node1".to_string(),
                ResultStoreSettings::default(),
            )
            .expect("store"),
        )
    }

    fn rows(values: &[&str]) -> Vec<Row> {
        values.iter().map(|value| Row::new([*value])).collect()
    }

    #[test]
    fn changes_returns_only_undelivered_rows() {
        let store = store();
        let sink = ResultSink::new(store.clone(), store.cancellation_token());
        let changes = [ResultRequest::new("t", Fetch::Changes)];

        sink.add_rows("t", rows(&["a", "b"]));
        let first = store.snapshot(&changes);
        assert_eq!(first.results[0].rows, rows(&["a", "b"]));

        assert!(store.snapshot(&changes).results[0].rows.is_empty());

        sink.add_rows("t", rows(&["c"]));
        let third = store.snapshot(&changes);
        assert_eq!(third.results[0].rows, rows(&["c"]));
        assert_eq!(third.results[0].result_range, OffsetRange::new(2, 1));
        assert_eq!(third.results[0].total_results, Some(3));
    }

    #[test]
    fn delivery_is_tracked_per_component() {
        let store = store();
        let sink = ResultSink::new(store.clone(), store.cancellation_token());
        sink.add_rows("a", rows(&["1"]));
        sink.add_rows("b", rows(&["2"]));

        store.snapshot(&[ResultRequest::new("a", Fetch::Changes)]);
        let snapshot = store.snapshot(&[
            ResultRequest::new("a", Fetch::Changes),
            ResultRequest::new("b", Fetch::Changes),
        ]);
        assert!(snapshot.results[0].rows.is_empty());
        assert_eq!(snapshot.results[1].rows, rows(&["2"]));
    }

    #[test]
    fn fetch_none_and_ranges() {
        let store = store();
        let sink = ResultSink::new(store.clone(), store.cancellation_token());
        sink.add_rows("t", rows(&["a", "b", "c", "d"]));

        let none = store.snapshot(&[ResultRequest::new("t", Fetch::None)]);
        assert!(none.results[0].rows.is_empty());
        assert_eq!(none.results[0].total_results, Some(4));

        let ranged = store
            .snapshot(&[ResultRequest::new("t", Fetch::All).with_range(OffsetRange::new(1, 2))]);
        assert_eq!(ranged.results[0].rows, rows(&["b", "c"]));
    }

    #[test]
    fn writes_after_terminate_are_discarded() {
        let store = store();
        let sink = ResultSink::new(store.clone(), store.cancellation_token());
        assert!(sink.add_rows("t", rows(&["a"])));

        store.terminate();
        assert!(sink.is_cancelled());
        assert!(sink.ensure_active().is_err());
        assert!(!sink.add_rows("t", rows(&["b"])));

        let info = store.info();
        assert_eq!(info.store_size, 1);
        assert!(info.complete);
        store.finish(Err(QueryError::SearchFailed("late".to_string())));
        assert!(store.snapshot(&[]).errors.is_empty());
    }

    #[test]
    fn terminate_before_execution_starts_cancels_it() {
        let store = store();
        store.terminate();

        let token = store.cancellation_token();
        assert!(token.is_cancelled());
        let sink = ResultSink::new(store.clone(), token);
        assert!(!sink.add_rows("t", rows(&["a"])));
        assert_eq!(store.info().store_size, 0);
    }

    #[test]
    fn visibility_follows_owner() {
        let store = store();
        assert!(store.is_visible_to(Some("alice")));
        assert!(!store.is_visible_to(Some("bob")));
        assert!(store.is_visible_to(None));
    }

    #[test]
    fn wait_returns_on_completion_or_timeout() {
        let store = store();
        assert!(!store.wait_for_completion(Duration::from_millis(10)));

        let waiter = {
            let store = store.clone();
            std::thread::spawn(move || store.wait_for_completion(Duration::from_secs(5)))
        };
        store.finish(Ok(()));
        assert!(waiter.join().expect("join"));
    }

    #[test]
    fn store_expiry_wins_over_process_expiry() {
        let store = store();
        let settings = ResultStoreSettings {
            search_process_lifespan: LifespanInfo {
                time_to_live: Some("1ms".to_string()),
                ..LifespanInfo::default()
            },
            store_lifespan: LifespanInfo {
                time_to_live: Some("1h".to_string()),
                ..LifespanInfo::default()
            },
        };
        store.update(settings).expect("update");
        let later = Instant::now() + Duration::from_millis(5);
        assert_eq!(store.expiry(later), Expiry::TerminateProcess);
        assert_eq!(store.expiry(later + Duration::from_secs(3600)), Expiry::Destroy);

        store.finish(Ok(()));
        assert_eq!(store.expiry(later), Expiry::Keep);
    }

    #[test]
    fn criteria_filter_by_owner_and_state() {
        let info = store().info();
        assert!(FindResultStoreCriteria::default().matches(&info));
        assert!(FindResultStoreCriteria {
            owner: Some("alice".to_string()),
            complete: Some(false),
        }
        .matches(&info));
        assert!(!FindResultStoreCriteria {
            owner: Some("bob".to_string()),
            complete: None,
        }
        .matches(&info));
    }
}
