use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::QueryKey;
use crate::expression::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    DashboardUi,
    QueryUi,
    #[default]
    Api,
    ScheduledQuery,
}

/// Who issued a search request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequestSource {
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_doc_uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateTimeSettings {
    /// Epoch milliseconds that relative times such as `now()` resolve against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_pattern: Option<String>,
}

/// How much of a component's accumulated rows a poll returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fetch {
    /// Metadata only.
    None,
    #[default]
    All,
    /// Rows not yet delivered to this component.
    Changes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetRange {
    pub offset: u64,
    pub length: u64,
}

impl OffsetRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Index bounds of this range within `total` items.
    pub(crate) fn bounds(&self, total: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(total);
        let length = usize::try_from(self.length).unwrap_or(usize::MAX);
        (start, start.saturating_add(length).min(total))
    }
}

/// Results wanted for one UI component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultRequest {
    pub component_id: String,
    /// Table settings, passed through to the search provider untouched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_range: Option<OffsetRange>,
    pub fetch: Fetch,
}

impl ResultRequest {
    pub fn new(component_id: impl Into<String>, fetch: Fetch) -> Self {
        Self {
            component_id: component_id.into(),
            fetch,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, range: OffsetRange) -> Self {
        self.requested_range = Some(range);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
    pub source: SearchRequestSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<QueryKey>,
    pub query: Query,
    pub result_requests: Vec<ResultRequest>,
    pub date_time_settings: DateTimeSettings,
    pub incremental: bool,
    /// Milliseconds to wait for completion before answering.
    #[serde(rename = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// A follow-up poll for an existing search.
    pub fn poll(key: QueryKey) -> Self {
        Self {
            key: Some(key),
            incremental: true,
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: QueryKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_result_request(mut self, request: ResultRequest) -> Self {
        self.result_requests.push(request);
        self
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}
