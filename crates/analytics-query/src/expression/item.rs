//! Expression item types (tree nodes).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::condition::Condition;

/// Tri-state enabled flag.
///
/// Only an explicit `Disabled` turns an item off; `Inherit` is what an absent
/// `enabled` field deserializes to. On the wire only `false` is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Enablement {
    #[default]
    Inherit,
    Enabled,
    Disabled,
}

impl Enablement {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => Self::Inherit,
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
        }
    }

    pub fn flag(self) -> Option<bool> {
        match self {
            Self::Inherit => None,
            Self::Enabled => Some(true),
            Self::Disabled => Some(false),
        }
    }

    /// Effective value: everything except `Disabled` counts as enabled.
    pub fn is_enabled(&self) -> bool {
        *self != Self::Disabled
    }
}

impl Serialize for Enablement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.flag().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Enablement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(Self::from_flag)
    }
}

/// Logical operator of an operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Op {
    #[default]
    And,
    Or,
    Not,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// Reference to an external document (dictionary, folder, user, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRef {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DocRef {
    pub fn new(doc_type: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            uuid: uuid.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name when known, otherwise the uuid.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.uuid.as_str())
    }
}

/// A node in an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExpressionItem {
    Operator(ExpressionOperator),
    Term(ExpressionTerm),
}

/// An AND/OR/NOT node with ordered children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionOperator {
    #[serde(default)]
    pub op: Op,
    #[serde(default, skip_serializing_if = "Enablement::is_enabled")]
    pub enabled: Enablement,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExpressionItem>,
}

/// A leaf predicate over a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionTerm {
    #[serde(default, skip_serializing_if = "Enablement::is_enabled")]
    pub enabled: Enablement,
    #[serde(default)]
    pub field: String,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<DocRef>,
}

impl ExpressionItem {
    pub fn enablement(&self) -> Enablement {
        match self {
            Self::Operator(operator) => operator.enabled,
            Self::Term(term) => term.enabled,
        }
    }

    /// True unless the item is explicitly disabled.
    pub fn enabled(&self) -> bool {
        self.enablement().is_enabled()
    }

    pub fn as_operator(&self) -> Option<&ExpressionOperator> {
        match self {
            Self::Operator(operator) => Some(operator),
            Self::Term(_) => None,
        }
    }

    pub fn as_term(&self) -> Option<&ExpressionTerm> {
        match self {
            Self::Operator(_) => None,
            Self::Term(term) => Some(term),
        }
    }

    /// True if any term in this subtree uses one of `fields`.
    pub fn contains_field(&self, fields: &[&str]) -> bool {
        match self {
            Self::Operator(operator) => operator.contains_field(fields),
            Self::Term(term) => fields.iter().any(|field| *field == term.field),
        }
    }

    /// True if any term in this subtree satisfies `predicate`.
    pub fn contains_term(&self, predicate: &dyn Fn(&ExpressionTerm) -> bool) -> bool {
        match self {
            Self::Operator(operator) => operator.contains_term(predicate),
            Self::Term(term) => predicate(term),
        }
    }

    /// Returns a copy carrying the given enabled state.
    pub fn with_enabled(self, enabled: Enablement) -> Self {
        match self {
            Self::Operator(mut operator) => {
                operator.enabled = enabled;
                Self::Operator(operator)
            }
            Self::Term(mut term) => {
                term.enabled = enabled;
                Self::Term(term)
            }
        }
    }
}

impl From<ExpressionOperator> for ExpressionItem {
    fn from(operator: ExpressionOperator) -> Self {
        Self::Operator(operator)
    }
}

impl From<ExpressionTerm> for ExpressionItem {
    fn from(term: ExpressionTerm) -> Self {
        Self::Term(term)
    }
}

impl ExpressionOperator {
    pub fn new(op: Op, children: Vec<ExpressionItem>) -> Self {
        Self {
            op,
            enabled: Enablement::Inherit,
            children,
        }
    }

    pub fn and(children: Vec<ExpressionItem>) -> Self {
        Self::new(Op::And, children)
    }

    pub fn or(children: Vec<ExpressionItem>) -> Self {
        Self::new(Op::Or, children)
    }

    pub fn not(children: Vec<ExpressionItem>) -> Self {
        Self::new(Op::Not, children)
    }

    pub fn with_enabled(mut self, enabled: Enablement) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_enabled_children(&self) -> bool {
        self.children.iter().any(ExpressionItem::enabled)
    }

    pub fn enabled_children(&self) -> impl Iterator<Item = &ExpressionItem> {
        self.children.iter().filter(|child| child.enabled())
    }

    pub fn contains_field(&self, fields: &[&str]) -> bool {
        self.children.iter().any(|child| child.contains_field(fields))
    }

    pub fn contains_term(&self, predicate: &dyn Fn(&ExpressionTerm) -> bool) -> bool {
        self.children
            .iter()
            .any(|child| child.contains_term(predicate))
    }
}

impl ExpressionTerm {
    pub fn new(field: impl Into<String>, condition: Condition, value: impl Into<String>) -> Self {
        Self {
            enabled: Enablement::Inherit,
            field: field.into(),
            condition,
            value: Some(value.into()),
            doc_ref: None,
        }
    }

    pub fn with_doc_ref(field: impl Into<String>, condition: Condition, doc_ref: DocRef) -> Self {
        Self {
            enabled: Enablement::Inherit,
            field: field.into(),
            condition,
            value: None,
            doc_ref: Some(doc_ref),
        }
    }

    pub fn with_enabled(mut self, enabled: Enablement) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// The value, or an empty string when absent.
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// True if the term carries something to match on.
    pub fn has_value(&self) -> bool {
        if !self.value_str().trim().is_empty() {
            return true;
        }
        self.condition == Condition::IsDocRef
            && self
                .doc_ref
                .as_ref()
                .is_some_and(|doc_ref| !doc_ref.uuid.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: &str, value: &str) -> ExpressionItem {
        ExpressionTerm::new(field, Condition::Equals, value).into()
    }

    #[test]
    fn absent_enabled_means_enabled() {
        let item: ExpressionItem =
            serde_json::from_str(r#"{"type":"term","field":"feed","condition":"EQUALS","value":"X"}"#)
                .expect("term");
        assert_eq!(item.enablement(), Enablement::Inherit);
        assert!(item.enabled());
    }

    #[test]
    fn only_disabled_is_written() {
        let enabled = ExpressionOperator::and(vec![term("a", "1")]).with_enabled(Enablement::Enabled);
        let json = serde_json::to_string(&enabled).expect("json");
        assert!(!json.contains("enabled"));

        let disabled = ExpressionOperator::and(vec![term("a", "1")]).with_enabled(Enablement::Disabled);
        let json = serde_json::to_string(&disabled).expect("json");
        assert!(json.contains(r#""enabled":false"#));

        let term = ExpressionTerm::new("a", Condition::Equals, "1");
        let json = serde_json::to_string(&term.clone().with_enabled(Enablement::Enabled))
            .expect("json");
        assert!(!json.contains("enabled"));
        let json = serde_json::to_string(&term.with_enabled(Enablement::Disabled)).expect("json");
        assert!(json.contains(r#""enabled":false"#));
    }

    #[test]
    fn operator_wire_shape() {
        let operator = ExpressionOperator::or(vec![
            term("feed", "X"),
            ExpressionOperator::not(vec![term("user", "bob")]).into(),
        ]);
        let json = serde_json::to_value(ExpressionItem::from(operator.clone())).expect("json");
        assert_eq!(json["type"], "operator");
        assert_eq!(json["op"], "OR");
        assert_eq!(json["children"][0]["type"], "term");
        assert_eq!(json["children"][1]["op"], "NOT");

        let parsed: ExpressionItem = serde_json::from_value(json).expect("parse");
        assert_eq!(parsed, ExpressionItem::Operator(operator));
    }

    #[test]
    fn absent_op_defaults_to_and() {
        let item: ExpressionItem = serde_json::from_str(r#"{"type":"operator"}"#).expect("operator");
        let operator = item.as_operator().expect("operator");
        assert_eq!(operator.op, Op::And);
        assert!(!operator.has_children());
    }

    #[test]
    fn contains_field_recurses() {
        let operator = ExpressionOperator::and(vec![
            term("a", "1"),
            ExpressionOperator::or(vec![term("b", "2")]).into(),
        ]);
        assert!(operator.contains_field(&["b"]));
        assert!(operator.contains_field(&["x", "a"]));
        assert!(!operator.contains_field(&["c"]));
    }

    #[test]
    fn contains_term_applies_predicate() {
        let operator = ExpressionOperator::and(vec![
            term("a", "1"),
            ExpressionOperator::not(vec![term("b", "secret")]).into(),
        ]);
        assert!(operator.contains_term(&|term| term.value_str() == "secret"));
        assert!(!operator.contains_term(&|term| term.condition == Condition::Contains));
    }

    #[test]
    fn enabled_children_skip_disabled() {
        let operator = ExpressionOperator::and(vec![
            term("a", "1").with_enabled(Enablement::Disabled),
            term("b", "2").with_enabled(Enablement::Enabled),
        ]);
        assert!(operator.has_enabled_children());
        let names: Vec<_> = operator
            .enabled_children()
            .filter_map(ExpressionItem::as_term)
            .map(|term| term.field.as_str())
            .collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn doc_ref_term_has_value() {
        let term = ExpressionTerm::with_doc_ref(
            "owner",
            Condition::IsDocRef,
            DocRef::new("User", "1234"),
        );
        assert!(term.has_value());

        let blank = ExpressionTerm::new("feed", Condition::Equals, "  ");
        assert!(!blank.has_value());
    }
}
