use super::item::{ExpressionItem, ExpressionOperator, Op};

/// Removes disabled items and empty operators, collapses single-child
/// operators and cancels double negation.
///
/// The result is always an operator; a bare term is wrapped in AND and an
/// expression that simplifies to nothing becomes an empty AND.
pub fn simplify(root: &ExpressionOperator) -> ExpressionOperator {
    match simplify_operator(root) {
        Some(ExpressionItem::Operator(operator)) => operator,
        Some(item) => ExpressionOperator::and(vec![item]),
        None => ExpressionOperator::default(),
    }
}

fn simplify_item(item: &ExpressionItem) -> Option<ExpressionItem> {
    match item {
        ExpressionItem::Term(term) if term.enabled() => Some(ExpressionItem::Term(term.clone())),
        ExpressionItem::Term(_) => None,
        ExpressionItem::Operator(operator) => simplify_operator(operator),
    }
}

fn simplify_operator(operator: &ExpressionOperator) -> Option<ExpressionItem> {
    if !operator.enabled() {
        return None;
    }

    let mut children: Vec<ExpressionItem> = operator
        .children
        .iter()
        .filter_map(simplify_item)
        .map(|child| collapse_into(operator.op, child))
        .collect();
    if children.is_empty() {
        return None;
    }

    // NOT { NOT { x } } => x
    if operator.op == Op::Not && children.len() == 1 {
        if let Some(ExpressionItem::Operator(inner)) = children.first_mut() {
            if inner.op == Op::Not && inner.children.len() == 1 {
                return inner.children.pop();
            }
        }
    }

    Some(ExpressionItem::Operator(ExpressionOperator {
        op: operator.op,
        enabled: operator.enabled,
        children,
    }))
}

/// Lifts the only child of `child` into `parent` unless either side is a NOT.
fn collapse_into(parent: Op, child: ExpressionItem) -> ExpressionItem {
    match child {
        ExpressionItem::Operator(mut inner)
            if parent != Op::Not && inner.op != Op::Not && inner.children.len() == 1 =>
        {
            inner.children.remove(0)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Condition, Enablement, ExpressionTerm};

    fn term(field: &str) -> ExpressionItem {
        ExpressionTerm::new(field, Condition::Equals, "v").into()
    }

    fn disabled(item: ExpressionItem) -> ExpressionItem {
        item.with_enabled(Enablement::Disabled)
    }

    #[test]
    fn drops_disabled_and_empty() {
        let root = ExpressionOperator::and(vec![
            term("a"),
            disabled(term("b")),
            ExpressionOperator::or(vec![]).into(),
            ExpressionOperator::or(vec![disabled(term("c"))]).into(),
            term("d"),
        ]);
        let simplified = simplify(&root);
        assert_eq!(simplified, ExpressionOperator::and(vec![term("a"), term("d")]));
    }

    #[test]
    fn collapses_single_child_operators() {
        let root = ExpressionOperator::and(vec![
            ExpressionOperator::or(vec![ExpressionOperator::and(vec![term("a")]).into()]).into(),
            term("b"),
        ]);
        assert_eq!(
            simplify(&root),
            ExpressionOperator::and(vec![term("a"), term("b")])
        );
    }

    #[test]
    fn keeps_single_child_not() {
        let root = ExpressionOperator::and(vec![
            ExpressionOperator::not(vec![term("a")]).into(),
            term("b"),
        ]);
        assert_eq!(simplify(&root), root);
    }

    #[test]
    fn cancels_double_negation() {
        let root = ExpressionOperator::and(vec![
            ExpressionOperator::not(vec![ExpressionOperator::not(vec![term("a")]).into()]).into(),
            term("b"),
        ]);
        assert_eq!(
            simplify(&root),
            ExpressionOperator::and(vec![term("a"), term("b")])
        );
    }

    #[test]
    fn root_term_is_wrapped() {
        let root = ExpressionOperator::not(vec![ExpressionOperator::not(vec![term("a")]).into()]);
        assert_eq!(simplify(&root), ExpressionOperator::and(vec![term("a")]));
    }

    #[test]
    fn everything_disabled_gives_empty_and() {
        let root = ExpressionOperator::or(vec![disabled(term("a"))]);
        let simplified = simplify(&root);
        assert_eq!(simplified.op, Op::And);
        assert!(simplified.children.is_empty());

        let root = ExpressionOperator::or(vec![term("a")]).with_enabled(Enablement::Disabled);
        assert_eq!(simplify(&root), ExpressionOperator::default());
    }

    #[test]
    fn idempotent() {
        let roots = vec![
            ExpressionOperator::and(vec![
                ExpressionOperator::not(vec![ExpressionOperator::and(vec![
                    ExpressionOperator::not(vec![term("a")]).into(),
                ])
                .into()])
                .into(),
                ExpressionOperator::or(vec![term("b"), disabled(term("c"))]).into(),
            ]),
            ExpressionOperator::not(vec![ExpressionOperator::not(vec![
                ExpressionOperator::not(vec![term("x")]).into(),
            ])
            .into()]),
            ExpressionOperator::or(vec![ExpressionOperator::and(vec![term("y"), term("z")]).into()]),
        ];
        for root in roots {
            let once = simplify(&root);
            assert_eq!(simplify(&once), once);
        }
    }
}
