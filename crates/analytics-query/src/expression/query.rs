use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::item::{DocRef, ExpressionItem, ExpressionOperator, ExpressionTerm};
use crate::params::{param_map, Param};

/// Absolute or relative time bounds, kept as the client wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// A runnable query: where to look and what to match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DocRef>,
    #[serde(default)]
    pub expression: ExpressionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

impl Query {
    pub fn new(data_source: DocRef, expression: ExpressionOperator) -> Self {
        Self {
            data_source: Some(data_source),
            expression,
            params: Vec::new(),
            time_range: None,
        }
    }

    /// Expression with this query's own params substituted into term values.
    pub fn resolved_expression(&self, keep_unmatched: bool) -> ExpressionOperator {
        super::replace_expression_parameters(
            &self.expression,
            &param_map(&self.params),
            keep_unmatched,
        )
    }

    /// `time_field >= from` and `time_field < to` for whichever bounds the
    /// time range has.
    pub fn time_range_expression(&self, time_field: &str) -> Option<ExpressionOperator> {
        let range = self.time_range.as_ref()?;
        let bound = |value: &Option<String>, condition: Condition| {
            value
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(|value| ExpressionItem::from(ExpressionTerm::new(time_field, condition, value)))
        };
        let terms: Vec<_> = [
            bound(&range.from, Condition::GreaterThanOrEqualTo),
            bound(&range.to, Condition::LessThan),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!terms.is_empty()).then(|| ExpressionOperator::and(terms))
    }

    /// ANDs the time range bounds on `time_field` onto the expression.
    pub fn add_time_range(&mut self, time_field: &str) {
        if let Some(bounds) = self.time_range_expression(time_field) {
            let expression = std::mem::take(&mut self.expression);
            self.expression = super::combine(Some(bounds), Some(expression));
        }
    }
}
