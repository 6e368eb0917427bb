//! Node affinity for search sessions.
//!
//! A session lives on the node that created it. `SessionLocator` records
//! which node that is and `RemoteExecutor` forwards calls there.

use std::time::Duration;

use moka::sync::Cache;

use super::key::QueryKey;
use super::lifespan::{DestroyReason, ResultStoreSettings};
use super::request::SearchRequest;
use super::response::SearchResponse;
use crate::config::SearchConfig;
use crate::error::{QueryError, Result};

pub trait SessionLocator: Send + Sync {
    /// Node owning `key`, if known.
    fn node_for(&self, key: &QueryKey) -> Option<String>;
    fn register(&self, key: &QueryKey, node: &str);
    fn forget(&self, key: &QueryKey);
}

/// Locator for a single node deployment: every key is local.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSessionLocator;

impl SessionLocator for LocalSessionLocator {
    fn node_for(&self, _key: &QueryKey) -> Option<String> {
        None
    }

    fn register(&self, _key: &QueryKey, _node: &str) {}

    fn forget(&self, _key: &QueryKey) {}
}

/// Shared key to node map whose entries expire when unused.
#[derive(Debug, Clone)]
pub struct MokaSessionLocator {
    nodes: Cache<QueryKey, String>,
}

impl MokaSessionLocator {
    pub fn new(time_to_idle: Duration) -> Self {
        let nodes = Cache::builder().time_to_idle(time_to_idle).build();
        Self { nodes }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(Duration::from_millis(config.locator_time_to_idle_ms))
    }
}

impl SessionLocator for MokaSessionLocator {
    fn node_for(&self, key: &QueryKey) -> Option<String> {
        self.nodes.get(key)
    }

    fn register(&self, key: &QueryKey, node: &str) {
        self.nodes.insert(key.clone(), node.to_string());
    }

    fn forget(&self, key: &QueryKey) {
        self.nodes.invalidate(key);
    }
}

/// Forwards session calls to the node that owns the session.
pub trait RemoteExecutor: Send + Sync {
    fn search(&self, node: &str, request: &SearchRequest) -> Result<SearchResponse>;
    fn exists(&self, node: &str, key: &QueryKey, owner: Option<&str>) -> Result<bool>;
    fn terminate(&self, node: &str, key: &QueryKey) -> Result<bool>;
    fn destroy(&self, node: &str, key: &QueryKey, reason: DestroyReason) -> Result<bool>;
    fn update(&self, node: &str, key: &QueryKey, settings: &ResultStoreSettings) -> Result<bool>;
}

/// Executor for deployments without remote transport; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteExecutor;

impl NoRemoteExecutor {
    fn unavailable<T>(node: &str) -> Result<T> {
        Err(QueryError::RemoteDispatch {
            node: node.to_string(),
            message: "no remote executor configured".to_string(),
        })
    }
}

impl RemoteExecutor for NoRemoteExecutor {
    fn search(&self, node: &str, _request: &SearchRequest) -> Result<SearchResponse> {
        Self::unavailable(node)
    }

    fn exists(&self, node: &str, _key: &QueryKey, _owner: Option<&str>) -> Result<bool> {
        Self::unavailable(node)
    }

    fn terminate(&self, node: &str, _key: &QueryKey) -> Result<bool> {
        Self::unavailable(node)
    }

    fn destroy(&self, node: &str, _key: &QueryKey, _reason: DestroyReason) -> Result<bool> {
        Self::unavailable(node)
    }

    fn update(&self, node: &str, _key: &QueryKey, _settings: &ResultStoreSettings) -> Result<bool> {
        Self::unavailable(node)
    }
}
