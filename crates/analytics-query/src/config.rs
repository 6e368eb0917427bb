//! Search engine configuration.
//!
//! Values come from serde (usually a JSON document) and may then be
//! overridden from the environment.

use std::env;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::search::LifespanInfo;

pub const DEFAULT_NODE_NAME: &str = "node1";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_LOCATOR_TIME_TO_IDLE_MS: u64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Name of the node this manager runs on.
    pub node_name: String,
    /// Number of threads in the search worker pool.
    pub worker_threads: usize,
    /// Timeout applied to non-incremental requests that do not carry one.
    pub default_timeout_ms: u64,
    /// How often the background sweep looks for expired stores.
    pub sweep_interval_ms: u64,
    /// How long an unused key-to-node mapping is remembered.
    pub locator_time_to_idle_ms: u64,
    /// Lifespan applied to the search process of new stores.
    pub search_process_lifespan: LifespanInfo,
    /// Lifespan applied to the stored results of new stores.
    pub store_lifespan: LifespanInfo,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            node_name: DEFAULT_NODE_NAME.to_string(),
            worker_threads: default_worker_threads(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            locator_time_to_idle_ms: DEFAULT_LOCATOR_TIME_TO_IDLE_MS,
            search_process_lifespan: LifespanInfo {
                time_to_idle: None,
                time_to_live: None,
                destroy_on_tab_close: true,
                destroy_on_window_close: true,
            },
            store_lifespan: LifespanInfo {
                time_to_idle: Some("1h".to_string()),
                time_to_live: None,
                destroy_on_tab_close: true,
                destroy_on_window_close: true,
            },
        }
    }
}

impl SearchConfig {
    /// Parses a config document, filling absent fields with defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `QUERY_*` environment overrides on top of this config.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(node_name) = env::var("QUERY_NODE_NAME") {
            if !node_name.trim().is_empty() {
                self.node_name = node_name.trim().to_string();
            }
        }
        self.worker_threads = read_limit("QUERY_WORKER_THREADS", self.worker_threads);
        self.default_timeout_ms =
            read_limit("QUERY_DEFAULT_TIMEOUT_MS", self.default_timeout_ms as usize) as u64;
        self.sweep_interval_ms =
            read_limit("QUERY_SWEEP_INTERVAL_MS", self.sweep_interval_ms as usize) as u64;
        self
    }

    /// Checks that the lifespan duration strings parse.
    pub fn validate(&self) -> Result<()> {
        if self.node_name.trim().is_empty() {
            return Err(QueryError::Config("node name must not be empty".to_string()));
        }
        self.search_process_lifespan
            .to_lifespan()
            .map_err(|error| QueryError::Config(format!("search process lifespan: {error}")))?;
        self.store_lifespan
            .to_lifespan()
            .map_err(|error| QueryError::Config(format!("store lifespan: {error}")))?;
        Ok(())
    }
}

fn default_worker_threads() -> usize {
    thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
        .max(1)
}

fn read_limit(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SearchConfig::from_json(r#"{"nodeName":"node7","defaultTimeoutMs":500}"#)
            .expect("config");
        assert_eq!(config.node_name, "node7");
        assert_eq!(config.default_timeout_ms, 500);
        assert_eq!(config.sweep_interval_ms, DEFAULT_SWEEP_INTERVAL_MS);
        assert_eq!(config.store_lifespan.time_to_idle.as_deref(), Some("1h"));
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn bad_lifespan_duration_is_rejected() {
        let error = SearchConfig::from_json(r#"{"storeLifespan":{"timeToLive":"ten minutes"}}"#)
            .expect_err("invalid duration");
        assert!(matches!(error, QueryError::Config(_)));
    }

    #[test]
    fn blank_node_name_is_rejected() {
        let error = SearchConfig::from_json(r#"{"nodeName":"  "}"#).expect_err("blank node");
        assert!(matches!(error, QueryError::Config(_)));
    }

    #[test]
    fn read_limit_ignores_unset_variables() {
        assert_eq!(read_limit("QUERY_TEST_UNSET_LIMIT_VARIABLE", 12), 12);
    }
}
