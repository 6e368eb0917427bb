use super::item::{ExpressionItem, ExpressionOperator, ExpressionTerm};

/// Enabled terms that carry a value, optionally restricted to `field_names`.
///
/// Disabled operators hide their whole subtree. NOT does not: terms beneath a
/// negation are still returned.
pub fn terms<'a>(
    operator: &'a ExpressionOperator,
    field_names: Option<&[&str]>,
) -> Vec<&'a ExpressionTerm> {
    let mut out = Vec::new();
    collect_terms(operator, field_names, &mut out);
    out
}

fn collect_terms<'a>(
    operator: &'a ExpressionOperator,
    field_names: Option<&[&str]>,
    out: &mut Vec<&'a ExpressionTerm>,
) {
    if !operator.enabled() {
        return;
    }
    for child in operator.enabled_children() {
        match child {
            ExpressionItem::Operator(inner) => collect_terms(inner, field_names, out),
            ExpressionItem::Term(term) => {
                let field_matches = field_names
                    .map_or(true, |names| names.iter().any(|name| *name == term.field));
                if field_matches && term.has_value() {
                    out.push(term);
                }
            }
        }
    }
}

/// Distinct field names of the enabled terms, in first-seen order.
pub fn fields(operator: &ExpressionOperator) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in enabled_terms(operator) {
        if !out.iter().any(|field| *field == term.field) {
            out.push(term.field.clone());
        }
    }
    out
}

/// Non-blank values of the enabled terms, in tree order.
pub fn values(operator: &ExpressionOperator) -> Vec<String> {
    enabled_terms(operator)
        .into_iter()
        .filter(|term| !term.value_str().trim().is_empty())
        .map(|term| term.value_str().to_string())
        .collect()
}

/// Number of enabled terms.
pub fn term_count(operator: &ExpressionOperator) -> usize {
    enabled_terms(operator).len()
}

/// True when no enabled term remains.
pub fn is_empty(operator: &ExpressionOperator) -> bool {
    term_count(operator) == 0
}

/// AND of both sides; an absent or empty side yields the other.
pub fn combine(
    left: Option<ExpressionOperator>,
    right: Option<ExpressionOperator>,
) -> ExpressionOperator {
    let left = left.filter(|operator| !is_empty(operator));
    let right = right.filter(|operator| !is_empty(operator));
    match (left, right) {
        (Some(left), Some(right)) => ExpressionOperator::and(vec![left.into(), right.into()]),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => ExpressionOperator::default(),
    }
}

fn enabled_terms(operator: &ExpressionOperator) -> Vec<&ExpressionTerm> {
    let mut out = Vec::new();
    walk_enabled(operator, &mut out);
    out
}

fn walk_enabled<'a>(operator: &'a ExpressionOperator, out: &mut Vec<&'a ExpressionTerm>) {
    if !operator.enabled() {
        return;
    }
    for child in operator.enabled_children() {
        match child {
            ExpressionItem::Operator(inner) => walk_enabled(inner, out),
            ExpressionItem::Term(term) => out.push(term),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Condition, DocRef, Enablement};

    fn term(field: &str, value: &str) -> ExpressionItem {
        ExpressionTerm::new(field, Condition::Equals, value).into()
    }

    #[test]
    fn terms_include_negated_terms() {
        let root = ExpressionOperator::and(vec![
            term("feed", "X"),
            ExpressionOperator::not(vec![term("user", "bob")]).into(),
        ]);
        let found: Vec<_> = terms(&root, None).into_iter().map(|t| t.field.as_str()).collect();
        assert_eq!(found, vec!["feed", "user"]);
    }

    #[test]
    fn terms_skip_disabled_and_blank() {
        let root = ExpressionOperator::and(vec![
            term("feed", "X"),
            term("feed", " "),
            term("feed", "Y").with_enabled(Enablement::Disabled),
            ExpressionOperator::or(vec![term("feed", "Z")])
                .with_enabled(Enablement::Disabled)
                .into(),
            term("host", "h"),
        ]);
        let found: Vec<_> = terms(&root, Some(&["feed"]))
            .into_iter()
            .map(ExpressionTerm::value_str)
            .collect();
        assert_eq!(found, vec!["X"]);
    }

    #[test]
    fn doc_ref_terms_count_as_valued() {
        let root = ExpressionOperator::and(vec![ExpressionTerm::with_doc_ref(
            "owner",
            Condition::IsDocRef,
            DocRef::new("User", "u-1"),
        )
        .into()]);
        assert_eq!(terms(&root, Some(&["owner"])).len(), 1);
    }

    #[test]
    fn fields_values_and_counts() {
        let root = ExpressionOperator::or(vec![
            term("a", "1"),
            term("b", ""),
            ExpressionOperator::and(vec![term("a", "2")]).into(),
        ]);
        assert_eq!(fields(&root), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(values(&root), vec!["1".to_string(), "2".to_string()]);
        assert_eq!(term_count(&root), 3);
        assert!(!is_empty(&root));
        assert!(is_empty(&ExpressionOperator::and(vec![
            term("a", "1").with_enabled(Enablement::Disabled)
        ])));
    }

    #[test]
    fn combine_prefers_non_empty_side() {
        let left = ExpressionOperator::and(vec![term("a", "1")]);
        let right = ExpressionOperator::or(vec![term("b", "2")]);

        assert_eq!(combine(Some(left.clone()), None), left);
        assert_eq!(combine(Some(ExpressionOperator::default()), Some(right.clone())), right);
        assert_eq!(combine(None, None), ExpressionOperator::default());

        let both = combine(Some(left.clone()), Some(right.clone()));
        assert_eq!(both, ExpressionOperator::and(vec![left.into(), right.into()]));
    }
}
