use serde::{Deserialize, Serialize};

use super::key::QueryKey;
use super::request::OffsetRange;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub values: Vec<String>,
}

impl Row {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResult {
    pub component_id: String,
    pub rows: Vec<Row>,
    pub result_range: OffsetRange,
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    FatalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub severity: Severity,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub key: QueryKey,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub results: Vec<TableResult>,
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_messages: Vec<ErrorMessage>,
}

impl SearchResponse {
    /// The table for `component_id`, if it was requested.
    pub fn table(&self, component_id: &str) -> Option<&TableResult> {
        self.results
            .iter()
            .find(|result| result.component_id == component_id)
    }

    pub fn has_errors(&self) -> bool {
        self.error_messages
            .iter()
            .any(|message| message.severity >= Severity::Error)
    }
}
