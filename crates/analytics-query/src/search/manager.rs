//! ResultStoreManager - entry point for search sessions.


use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::key::QueryKey;
use super::lifespan::{DestroyReason, ResultStoreSettings};
use super::provider::SearchProvider;
use super::remote::{LocalSessionLocator, NoRemoteExecutor, RemoteExecutor, SessionLocator};
use super::request::SearchRequest;
use super::response::{ErrorMessage, SearchResponse};
use super::store::{Expiry, FindResultStoreCriteria, ResultSink, ResultStore, ResultStoreInfo};
use super::sweeper::Sweeper;
use crate::config::SearchConfig;
use crate::error::{QueryError, Result};
use crate::expression;
use crate::params::{Param, CURRENT_USER};

/// Owns the result stores of this node and routes calls for stores owned
/// by other nodes.
pub struct ResultStoreManager {
    config: SearchConfig,
    provider: Arc<dyn SearchProvider>,
    locator: Arc<dyn SessionLocator>,
    remote: Arc<dyn RemoteExecutor>,
    stores: RwLock<HashMap<QueryKey, Arc<ResultStore>>>,
    pool: ThreadPool,
}

impl std::fmt::Debug for ResultStoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStoreManager")
            .field("node_name", &self.config.node_name)
            .field("stores", &self.stores.read().len())
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl ResultStoreManager {
    /// Single node manager.
    pub fn new(config: SearchConfig, provider: Arc<dyn SearchProvider>) -> Result<Self> {
        Self::with_cluster(
            config,
            provider,
            Arc::new(LocalSessionLocator),
            Arc::new(NoRemoteExecutor),
        )
    }

    /// Manager that shares session ownership with other nodes through
    /// `locator` and forwards to them through `remote`.
    pub fn with_cluster(
        config: SearchConfig,
        provider: Arc<dyn SearchProvider>,
        locator: Arc<dyn SessionLocator>,
        remote: Arc<dyn RemoteExecutor>,
    ) -> Result<Self> {
        config.validate()?;
        let node_name = config.node_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(move |index| format!("search-{node_name}-{index}"))
            .build()
            .map_err(|error| QueryError::Config(format!("unable to build worker pool: {error}")))?;

        log::info!(
            "result store manager started node={} workers={}",
            config.node_name,
            pool.current_num_threads()
        );

        Ok(Self {
            config,
            provider,
            locator,
            remote,
            stores: RwLock::new(HashMap::new()),
            pool,
        })
    }

    pub fn node_name(&self) -> &str {
        &self.config.node_name
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Starts a background sweep that evicts expired stores every
    /// `sweep_interval_ms`.
    pub fn start_sweeper(self: &Arc<Self>) -> Result<Sweeper> {
        Sweeper::spawn(self, Duration::from_millis(self.config.sweep_interval_ms))
    }

    /// Starts a new search (no key) or polls an existing one (key present).
    pub fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let Some(key) = request.key.clone() else {
            return self.start(request);
        };
        if let Some(node) = self.remote_node(&key) {
            return self.forward("search", &node, &key, |remote| {
                remote.search(&node, &request)
            });
        }

        // Touch under the registry read lock so the sweep, which decides
        // under the write lock, sees the access.
        let store = {
            let stores = self.stores.read();
            let store = stores
                .get(&key)
                .cloned()
                .ok_or_else(|| QueryError::NoActiveSearch(key.clone()))?;
            if !store.is_visible_to(request.owner.as_deref()) {
                log::warn!(
                    "search refused key={} owner={}",
                    key,
                    request.owner.as_deref().unwrap_or("-")
                );
                return Err(QueryError::PermissionDenied(key));
            }
            store.touch();
            store
        };
        log::debug!(
            "search poll key={} incremental={} components={}",
            key,
            request.incremental,
            request.result_requests.len()
        );
        Ok(self.respond(&store, &request))
    }

    fn start(&self, mut request: SearchRequest) -> Result<SearchResponse> {
        let data_source = request
            .query
            .data_source
            .clone()
            .ok_or_else(|| {
                QueryError::InvalidRequest("no data source has been provided".to_string())
            })?;
        expression::validate(&request.query.expression)?;
        self.provider.prepare(&request)?;

        let key = QueryKey::random();
        request.key = Some(key.clone());
        if let Some(owner) = &request.owner {
            request.query.params.push(Param::new(CURRENT_USER, owner.clone()));
        }
        if let Some(time_field) = self.provider.time_field(&data_source) {
            request.query.add_time_range(&time_field);
        }
        if request.date_time_settings.reference_time.is_none() {
            request.date_time_settings.reference_time = Some(chrono::Utc::now().timestamp_millis());
        }

        let store = Arc::new(ResultStore::new(
            key.clone(),
            request.source.clone(),
            Some(data_source.clone()),
            request.owner.clone(),
            self.config.node_name.clone(),
            ResultStoreSettings::from_config(&self.config),
        )?);
        self.stores.write().insert(key.clone(), store.clone());
        self.locator.register(&key, &self.config.node_name);

        log::info!(
            "result store created key={} node={} data_source={} owner={}",
            key,
            self.config.node_name,
            data_source.uuid,
            request.owner.as_deref().unwrap_or("-")
        );

        self.execute(store.clone(), request.clone());
        Ok(self.respond(&store, &request))
    }

    /// Runs the provider for `store` on the worker pool. Called once per
    /// store, so a key never has two executions in flight.
    fn execute(&self, store: Arc<ResultStore>, request: SearchRequest) {
        let provider = self.provider.clone();
        let token = store.cancellation_token();
        let sink = ResultSink::new(store.clone(), token.clone());
        self.pool.spawn(move || {
            let started = Instant::now();
            let outcome = provider.execute(&request, &sink, &token);
            match &outcome {
                Ok(()) => log::debug!(
                    "search finished key={} elapsed_ms={}",
                    store.key(),
                    started.elapsed().as_millis()
                ),
                Err(_) if token.is_cancelled() => log::debug!(
                    "search stopped after termination key={}",
                    store.key()
                ),
                Err(error) => log::warn!("search failed key={} error={}", store.key(), error),
            }
            store.finish(outcome);
        });
    }

    fn respond(&self, store: &ResultStore, request: &SearchRequest) -> SearchResponse {
        let timeout = Duration::from_millis(request.timeout_ms.unwrap_or(if request.incremental {
            0
        } else {
            self.config.default_timeout_ms
        }));
        let complete = store.wait_for_completion(timeout);

        if !complete && !request.incremental {
            log::debug!(
                "search timed out key={} timeout_ms={}",
                store.key(),
                timeout.as_millis()
            );
            return SearchResponse {
                key: store.key().clone(),
                highlights: Vec::new(),
                results: Vec::new(),
                complete: false,
                error_messages: vec![ErrorMessage::error(format!(
                    "The search timed out after {}ms",
                    timeout.as_millis()
                ))],
            };
        }

        let snapshot = store.snapshot(&request.result_requests);
        SearchResponse {
            key: store.key().clone(),
            highlights: snapshot.highlights,
            results: snapshot.results,
            complete: snapshot.complete,
            error_messages: snapshot.errors,
        }
    }

    /// Whether a store exists for `key` that `owner` may see, on whichever
    /// node owns it.
    pub fn exists(&self, key: &QueryKey, owner: Option<&str>) -> Result<bool> {
        if let Some(node) = self.remote_node(key) {
            return self.forward("exists", &node, key, |remote| {
                remote.exists(&node, key, owner)
            });
        }
        Ok(self
            .stores
            .read()
            .get(key)
            .is_some_and(|store| store.is_visible_to(owner)))
    }

    /// Stops the search for `key` and keeps its results.
    /// Returns false when there is no such store.
    pub fn terminate(&self, key: &QueryKey) -> Result<bool> {
        if let Some(node) = self.remote_node(key) {
            return self.forward("terminate", &node, key, |remote| {
                remote.terminate(&node, key)
            });
        }
        let store = self.stores.read().get(key).cloned();
        match store {
            Some(store) => {
                store.terminate();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Destroys the store for `key` as far as its lifespans allow `reason`.
    ///
    /// MANUAL and NO_LONGER_NEEDED always remove the store. TAB_CLOSE and
    /// WINDOW_CLOSE remove it if the store lifespan allows, otherwise stop
    /// the search if the process lifespan allows, otherwise do nothing.
    /// Destroying an unknown key succeeds.
    pub fn destroy(&self, key: &QueryKey, reason: DestroyReason) -> Result<bool> {
        if let Some(node) = self.remote_node(key) {
            return self.forward("destroy", &node, key, |remote| {
                remote.destroy(&node, key, reason)
            });
        }
        if reason.is_unconditional() {
            self.remove(key, reason);
            return Ok(true);
        }

        let Some(store) = self.stores.read().get(key).cloned() else {
            return Ok(true);
        };
        if store.store_lifespan().allows(reason) {
            self.remove(key, reason);
        } else if store.process_lifespan().allows(reason) {
            store.terminate();
        } else {
            log::debug!("destroy ignored key={} reason={:?}", key, reason);
        }
        Ok(true)
    }

    /// Replaces the lifespans of an existing store.
    pub fn update(&self, key: &QueryKey, settings: ResultStoreSettings) -> Result<bool> {
        if let Some(node) = self.remote_node(key) {
            return self.forward("update", &node, key, |remote| {
                remote.update(&node, key, &settings)
            });
        }
        let store = self.stores.read().get(key).cloned();
        match store {
            Some(store) => {
                store.update(settings)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stores held by this node that match `criteria`, oldest first.
    pub fn find(&self, criteria: &FindResultStoreCriteria) -> Vec<ResultStoreInfo> {
        let mut infos: Vec<ResultStoreInfo> = self
            .stores
            .read()
            .values()
            .map(|store| store.info())
            .filter(|info| criteria.matches(info))
            .collect();
        infos.sort_by(|a, b| a.creation_time.cmp(&b.creation_time));
        infos
    }

    /// Applies lifespan expiry to every local store. Returns the number of
    /// stores removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = Vec::new();
        {
            let mut stores = self.stores.write();
            stores.retain(|key, store| match store.expiry(now) {
                Expiry::Keep => true,
                Expiry::TerminateProcess => {
                    store.terminate();
                    true
                }
                Expiry::Destroy => {
                    store.destroy();
                    removed.push(key.clone());
                    false
                }
            });
        }
        for key in &removed {
            self.locator.forget(key);
            log::info!("result store evicted key={}", key);
        }
        removed.len()
    }

    /// Destroys every local store.
    pub fn clear(&self) {
        let drained: Vec<(QueryKey, Arc<ResultStore>)> = self.stores.write().drain().collect();
        for (key, store) in drained {
            store.destroy();
            self.locator.forget(&key);
        }
    }

    fn remove(&self, key: &QueryKey, reason: DestroyReason) {
        let removed = self.stores.write().remove(key);
        if let Some(store) = removed {
            store.destroy();
            self.locator.forget(key);
            log::info!("result store destroyed key={} reason={:?}", key, reason);
        }
    }

    fn forward<T>(
        &self,
        operation: &str,
        node: &str,
        key: &QueryKey,
        call: impl FnOnce(&dyn RemoteExecutor) -> Result<T>,
    ) -> Result<T> {
        log::debug!("forwarding {} key={} node={}", operation, key, node);
        call(self.remote.as_ref()).inspect_err(|error| {
            log::warn!(
                "remote {} failed key={} node={} error={}",
                operation,
                key,
                node,
                error
            )
        })
    }

    /// The owning node when it is not this one.
    fn remote_node(&self, key: &QueryKey) -> Option<String> {
        self.locator
            .node_for(key)
            .filter(|node| *node != self.config.node_name)
    }
}

impl Drop for ResultStoreManager {
    fn drop(&mut self) {
        for store in self.stores.get_mut().values() {
            store.terminate();
        }
    }
}
