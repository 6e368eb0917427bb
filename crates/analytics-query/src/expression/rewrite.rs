use std::collections::HashMap;

use super::item::{ExpressionItem, ExpressionOperator, ExpressionTerm};
use crate::params::replace_parameters;

/// Deep copy of an operator tree.
pub fn copy_operator(operator: &ExpressionOperator) -> ExpressionOperator {
    copy_operator_with(operator, &|_| true)
}

/// Deep copy that keeps only children accepted by `filter`.
///
/// The filter is applied to every child at every depth; the root itself is
/// always copied.
pub fn copy_operator_with<F>(operator: &ExpressionOperator, filter: &F) -> ExpressionOperator
where
    F: Fn(&ExpressionItem) -> bool,
{
    let children = operator
        .children
        .iter()
        .filter(|child| filter(child))
        .map(|child| match child {
            ExpressionItem::Operator(inner) => {
                ExpressionItem::Operator(copy_operator_with(inner, filter))
            }
            ExpressionItem::Term(term) => ExpressionItem::Term(term.clone()),
        })
        .collect();

    ExpressionOperator {
        op: operator.op,
        enabled: operator.enabled,
        children,
    }
}

/// Substitutes `${name}` references in every term value.
///
/// Unknown names are kept verbatim when `keep_unmatched` is set and replaced
/// with an empty string otherwise.
pub fn replace_expression_parameters(
    operator: &ExpressionOperator,
    params: &HashMap<String, String>,
    keep_unmatched: bool,
) -> ExpressionOperator {
    let children = operator
        .children
        .iter()
        .map(|child| match child {
            ExpressionItem::Operator(inner) => ExpressionItem::Operator(
                replace_expression_parameters(inner, params, keep_unmatched),
            ),
            ExpressionItem::Term(term) => {
                ExpressionItem::Term(replace_term(term, params, keep_unmatched))
            }
        })
        .collect();

    ExpressionOperator {
        op: operator.op,
        enabled: operator.enabled,
        children,
    }
}

fn replace_term(
    term: &ExpressionTerm,
    params: &HashMap<String, String>,
    keep_unmatched: bool,
) -> ExpressionTerm {
    let mut term = term.clone();
    if let Some(value) = term.value.as_deref() {
        term.value = Some(replace_parameters(value, params, keep_unmatched));
    }
    term
}
