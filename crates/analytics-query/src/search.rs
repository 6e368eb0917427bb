//! Incremental search sessions.
//!
//! A search is identified by a `QueryKey`. The first request (without a key)
//! creates a `ResultStore` and starts the search on the worker pool; later
//! requests carrying the key poll the same store for partial or complete
//! results until it is destroyed or expires.

mod key;
mod lifespan;
mod manager;
mod provider;
mod remote;
mod request;
mod response;
mod store;
mod sweeper;

pub use key::QueryKey;
pub use lifespan::{
    format_duration, parse_duration, DestroyReason, Lifespan, LifespanInfo, ResultStoreSettings,
};
pub use manager::ResultStoreManager;
pub use provider::SearchProvider;
pub use remote::{
    LocalSessionLocator, MokaSessionLocator, NoRemoteExecutor, RemoteExecutor, SessionLocator,
};
pub use request::{
    DateTimeSettings, Fetch, OffsetRange, ResultRequest, SearchRequest, SearchRequestSource,
    SourceType,
};
pub use response::{ErrorMessage, Row, SearchResponse, Severity, TableResult};
pub use store::{FindResultStoreCriteria, ResultSink, ResultStoreInfo, TaskProgress};
pub use sweeper::Sweeper;
