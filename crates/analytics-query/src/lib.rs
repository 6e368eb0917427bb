//! Query engine core for the analytics platform.
//!
//! This crate provides:
//! - The filter expression tree and its algebra (simplify, copy, substitute, extract)
//! - Parameter parsing and `${key}` substitution
//! - A context analyzer that works out which help categories apply at a cursor
//! - The incremental search session manager (query keys, polling, lifespans)

pub mod cancel;
pub mod config;
pub mod error;
pub mod expression;
pub mod language;
pub mod params;
pub mod search;

// Re-export main types
pub use cancel::CancellationToken;
pub use config::SearchConfig;
pub use error::{QueryError, Result};
pub use expression::{
    Condition, DocRef, Enablement, ExpressionItem, ExpressionOperator, ExpressionTerm, Op, Query,
    TimeRange,
};
pub use language::{ContextAnalyzer, ContextualQueryHelp, HelpCatalogue, QueryHelpType};
pub use params::Param;
pub use search::{
    DestroyReason, Fetch, Lifespan, LifespanInfo, QueryKey, ResultStoreManager, SearchRequest,
    SearchResponse,
};
