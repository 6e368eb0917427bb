use crate::expression::ExpressionItem;
use crate::search::QueryKey;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Expression validation error: {message}")]
    ExpressionValidation {
        message: String,
        item: Box<ExpressionItem>,
    },

    #[error("No active search found for key = {0}")]
    NoActiveSearch(QueryKey),

    #[error("You do not have permission to get the search results associated with key = {0}")]
    PermissionDenied(QueryKey),

    #[error("Remote dispatch to node {node} failed: {message}")]
    RemoteDispatch { node: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// Returns true when the caller can recover by resubmitting or retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoActiveSearch(_) | Self::RemoteDispatch { .. })
    }

    pub(crate) fn validation(message: impl Into<String>, item: ExpressionItem) -> Self {
        Self::ExpressionValidation {
            message: message.into(),
            item: Box::new(item),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
